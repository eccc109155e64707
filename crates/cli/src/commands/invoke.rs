use serde_json::Value;
use telcobot_agent::{billing_registry, shared_store, ToolError};
use telcobot_core::BillingMockStore;

use crate::commands::{current_thread_runtime, CommandResult};

/// Runs one billing tool against a freshly seeded store and prints its envelope.
///
/// Exit codes: 0 success envelope, 1 error envelope, 2 bad arguments, 3 unknown tool.
pub fn run(tool: &str, raw_arguments: &str) -> CommandResult {
    let arguments: Value = match serde_json::from_str(raw_arguments) {
        Ok(arguments) => arguments,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "invalid_arguments",
                format!("--args is not valid JSON: {error}"),
                2,
            );
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "invoke",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let registry = billing_registry(shared_store(BillingMockStore::seeded()));
    match runtime.block_on(registry.dispatch(tool, arguments)) {
        Ok(envelope) => {
            let exit_code = if envelope["status"] == "success" { 0 } else { 1 };
            CommandResult::document("invoke", exit_code, &envelope)
        }
        Err(ToolError::UnknownTool(name)) => CommandResult::failure(
            "invoke",
            "unknown_tool",
            format!("unknown tool `{name}` (see `telcobot tools`)"),
            3,
        ),
        Err(error) => CommandResult::failure("invoke", "invalid_arguments", error.to_string(), 2),
    }
}
