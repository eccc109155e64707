use std::sync::Arc;

use serde_json::{json, Value};
use telcobot_core::config::AgentConfig;
use telcobot_core::ApplicationError;
use thiserror::Error;
use tracing::{info, warn};

use crate::conversation::{SessionId, SessionStore};
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, ToolCall};
use crate::prompts::{
    BILLING_ASSISTANT_PROMPT, FINISHED_PROCESS_MARKER, MARKUP_RENDERER_PROMPT, WELCOME_MARKUP,
};
use crate::tools::ToolRegistry;
use crate::ui::{parse_markup, strip_code_fences, UiNode};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("language model request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("no final reply after {0} tool rounds")]
    ToolLoopExceeded(u32),
    #[error("language model returned an empty reply")]
    EmptyReply,
}

impl From<AgentError> for ApplicationError {
    fn from(error: AgentError) -> Self {
        ApplicationError::Integration(error.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    /// The model marked the current billing process as complete.
    pub finished: bool,
}

impl AgentReply {
    fn from_model(raw: &str) -> Self {
        let finished = raw.contains(FINISHED_PROCESS_MARKER);
        let text = raw.replace(FINISHED_PROCESS_MARKER, "").trim().to_string();
        Self { text, finished }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentResponse {
    pub reply: AgentReply,
    pub screen: UiNode,
}

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    max_tool_steps: u32,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, config: &AgentConfig) -> Self {
        Self {
            llm,
            tools,
            sessions: Arc::new(SessionStore::new(config.history_limit, config.max_sessions)),
            max_tool_steps: config.max_tool_steps.max(1),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one user turn through the tool-calling loop and records it in the session.
    pub async fn handle_message(
        &self,
        session: &SessionId,
        text: &str,
    ) -> Result<AgentReply, AgentError> {
        let mut messages = vec![ChatMessage::system(BILLING_ASSISTANT_PROMPT)];
        messages.extend(self.sessions.history(session).await);
        let user = ChatMessage::user(text);
        messages.push(user.clone());
        let mut exchange = vec![user];
        let definitions = self.tools.definitions();

        for step in 0..self.max_tool_steps {
            let completion = self
                .llm
                .complete(CompletionRequest { messages: messages.clone(), tools: definitions.clone() })
                .await?;

            if completion.tool_calls.is_empty() {
                let raw = completion.content.ok_or(AgentError::EmptyReply)?;
                let reply = AgentReply::from_model(&raw);
                exchange.push(ChatMessage::assistant(raw));
                self.sessions.record(session, exchange).await;
                info!(
                    event_name = "agent.turn.completed",
                    session_id = %session,
                    tool_rounds = step,
                    finished = reply.finished,
                    "agent turn completed"
                );
                return Ok(reply);
            }

            let request = ChatMessage::assistant_tool_calls(completion.content, completion.tool_calls);
            messages.push(request.clone());
            exchange.push(request.clone());

            for call in &request.tool_calls {
                let output = self.run_tool_call(session, call).await;
                let result = ChatMessage::tool_result(call.id.clone(), output.to_string());
                messages.push(result.clone());
                exchange.push(result);
            }
        }

        warn!(
            event_name = "agent.turn.tool_loop_exceeded",
            session_id = %session,
            max_tool_steps = self.max_tool_steps,
            "agent did not produce a final reply"
        );
        Err(AgentError::ToolLoopExceeded(self.max_tool_steps))
    }

    /// Failures are reported back to the model as error envelopes.
    async fn run_tool_call(&self, session: &SessionId, call: &ToolCall) -> Value {
        let name = call.function.name.as_str();
        info!(event_name = "agent.tool.invoked", session_id = %session, tool = name, "tool call");

        let arguments = match call.arguments() {
            Ok(arguments) => arguments,
            Err(error) => return error_envelope(format!("arguments are not valid JSON: {error}")),
        };
        match self.tools.dispatch(name, arguments).await {
            Ok(output) => output,
            Err(error) => error_envelope(error.to_string()),
        }
    }

    /// Asks the model to lay out `reply` as JSX-like markup.
    pub async fn render_markup(&self, reply: &str) -> Result<String, AgentError> {
        let completion = self
            .llm
            .complete(CompletionRequest {
                messages: vec![ChatMessage::system(MARKUP_RENDERER_PROMPT), ChatMessage::user(reply)],
                tools: Vec::new(),
            })
            .await?;
        let markup = completion.content.ok_or(AgentError::EmptyReply)?;
        Ok(strip_code_fences(&markup).to_string())
    }

    /// A full turn: agent reply, rendered markup, parsed screen.
    pub async fn respond(&self, session: &SessionId, text: &str) -> Result<AgentResponse, AgentError> {
        let reply = self.handle_message(session, text).await?;
        let markup = self.render_markup(&reply.text).await?;
        let screen = match parse_markup(&markup) {
            Ok(screen) => screen,
            Err(error) => {
                warn!(
                    event_name = "agent.markup.fallback",
                    session_id = %session,
                    error = %error,
                    "rendered markup did not parse, returning plain text"
                );
                UiNode::text_view(reply.text.clone())
            }
        };
        Ok(AgentResponse { reply, screen })
    }
}

pub fn welcome_screen() -> UiNode {
    parse_markup(WELCOME_MARKUP)
        .unwrap_or_else(|_| UiNode::text_view("What do you want do to today?"))
}

fn error_envelope(message: String) -> Value {
    json!({ "status": "error", "data": { "message": message } })
}
