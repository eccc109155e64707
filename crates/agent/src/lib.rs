//! Agent runtime for the telecom billing assistant.
//!
//! A user turn flows through three stages:
//! 1. **Tool loop** (`runtime`): the model calls billing tools (`billing_tools`)
//!    against the shared mock store until it produces a text reply.
//! 2. **Rendering** (`runtime::AgentRuntime::render_markup`): a second model
//!    call lays the reply out as React-Native-style markup.
//! 3. **Parsing** (`ui`): the markup is parsed deterministically into the
//!    JSON component tree the mobile client renders.
//!
//! Conversation history lives in memory (`conversation`) and is lost on restart.

pub mod billing_tools;
pub mod conversation;
pub mod llm;
pub mod prompts;
pub mod runtime;
pub mod tools;
pub mod ui;

pub use billing_tools::{billing_registry, shared_store, BillingOperation, SharedBillingStore};
pub use conversation::{SessionId, SessionStore};
pub use llm::{LlmClient, LlmError, OpenAiCompatibleClient};
pub use runtime::{welcome_screen, AgentError, AgentReply, AgentResponse, AgentRuntime};
pub use tools::{Tool, ToolDefinition, ToolError, ToolRegistry};
pub use ui::{parse_markup, MarkupError, UiNode};
