use std::sync::Arc;

use telcobot_agent::{
    billing_registry, shared_store, AgentRuntime, OpenAiCompatibleClient, SessionId,
};
use telcobot_core::config::{AppConfig, LoadOptions, LogFormat};
use telcobot_core::BillingMockStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::commands::{current_thread_runtime, CommandResult};

/// Interactive terminal conversation with the billing agent.
pub fn run(session: Option<String>, render: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2);
        }
    };
    init_logging(&config);

    let llm = match OpenAiCompatibleClient::from_config(&config.llm) {
        Ok(llm) => llm,
        Err(error) => return CommandResult::failure("chat", "llm_setup", error.to_string(), 5),
    };
    let registry = billing_registry(shared_store(BillingMockStore::seeded()));
    let agent = AgentRuntime::new(Arc::new(llm), Arc::new(registry), &config.agent);
    let session = SessionId::from_request(session.as_deref()).unwrap_or_else(SessionId::generate);

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let outcome = runtime.block_on(async {
        let input = BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        converse(&agent, &session, render, input, &mut output).await
    });

    match outcome {
        Ok(turns) => {
            CommandResult::success("chat", format!("session {session} closed after {turns} turns"))
        }
        Err(error) => CommandResult::failure("chat", "io", error.to_string(), 1),
    }
}

/// Reads one message per line until EOF or `exit`; returns the number of answered turns.
pub async fn converse<R, W>(
    agent: &AgentRuntime,
    session: &SessionId,
    render: bool,
    input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut turns = 0;
    output.write_all(format!("session {session}; type `exit` to quit\n").as_bytes()).await?;

    loop {
        output.write_all(b"you> ").await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") {
            break;
        }

        let answer = if render {
            match agent.respond(session, message).await {
                Ok(response) => serde_json::to_string_pretty(&response.screen)
                    .unwrap_or_else(|_| response.reply.text),
                Err(error) => format!("error: {error}"),
            }
        } else {
            match agent.handle_message(session, message).await {
                Ok(reply) => reply.text,
                Err(error) => format!("error: {error}"),
            }
        };
        output.write_all(format!("agent> {answer}\n").as_bytes()).await?;
        turns += 1;
    }

    output.flush().await?;
    Ok(turns)
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
