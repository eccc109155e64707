//! Chat-completion client for OpenAI-compatible endpoints (OpenAI, Ollama).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use telcobot_core::config::LlmConfig;
use thiserror::Error;
use tracing::{debug, warn};

use crate::tools::ToolDefinition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: Some(content.into()), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self { role: Role::Assistant, content, tool_calls, tool_call_id: None }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as produced by the model.
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall { name: name.into(), arguments: arguments.into() },
        }
    }

    /// Decoded arguments; an empty string means no arguments.
    pub fn arguments(&self) -> Result<Value, serde_json::Error> {
        if self.function.arguments.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&self.function.arguments)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmErrorKind {
    RateLimited,
    Server,
    Client,
    Network,
    Parse,
    Configuration,
}

impl LlmErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Server | Self::Network)
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self { kind, status_code: None, message: message.into(), retry_after: None }
    }

    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let kind = classify_http_status(status);
        Self {
            kind,
            status_code: Some(status),
            message: format!("llm endpoint returned HTTP {status}: {}", truncate(body, 300)),
            retry_after,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Linear backoff unless the server asked for a specific delay.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after.min(MAX_RETRY_DELAY);
        }
        let step = match self.kind {
            LlmErrorKind::RateLimited => Duration::from_secs(2),
            _ => Duration::from_millis(500),
        };
        step.saturating_mul(attempt + 1).min(MAX_RETRY_DELAY)
    }
}

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::Server,
        _ => LlmErrorKind::Client,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                LlmError::new(LlmErrorKind::Configuration, format!("http client: {error}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.effective_base_url()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": request.messages,
        });
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        },
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = Value::from("auto");
        }
        body
    }

    async fn send_once(&self, body: &Value) -> Result<Completion, LlmError> {
        let mut builder = self.client.post(&self.endpoint).json(body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|error| {
            let reason = if error.is_timeout() {
                "request timed out"
            } else if error.is_connect() {
                "connection failed"
            } else {
                "request failed"
            };
            LlmError::new(LlmErrorKind::Network, format!("{reason}: {error}"))
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let text = response.text().await.map_err(|error| {
            LlmError::new(LlmErrorKind::Network, format!("reading response body failed: {error}"))
        })?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &text, retry_after));
        }
        parse_completion(&text)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = self.request_body(&request);
        let mut attempt = 0;

        loop {
            debug!(
                event_name = "agent.llm.request",
                model = %self.model,
                attempt,
                messages = request.messages.len(),
                "sending chat completion"
            );
            match self.send_once(&body).await {
                Ok(completion) => return Ok(completion),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    let delay = error.suggested_delay(attempt);
                    warn!(
                        event_name = "agent.llm.retry",
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient llm failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// Extracts the first choice of a chat-completion response body.
pub fn parse_completion(body: &str) -> Result<Completion, LlmError> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|error| {
        LlmError::new(LlmErrorKind::Parse, format!("malformed completion response: {error}"))
    })?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::new(LlmErrorKind::Parse, "completion response had no choices"))?;

    Ok(Completion {
        content: choice.message.content.filter(|content| !content.trim().is_empty()),
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use telcobot_core::config::{LlmConfig, LlmProvider};

    use super::{
        classify_http_status, parse_completion, ChatMessage, CompletionRequest, LlmError,
        LlmErrorKind, OpenAiCompatibleClient, ToolCall,
    };
    use crate::tools::ToolDefinition;

    fn ollama_config() -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Ollama,
            api_key: None,
            base_url: None,
            model: "llama3.1".to_string(),
            temperature: 0.0,
            timeout_secs: 5,
            max_retries: 1,
        }
    }

    #[test]
    fn parses_text_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#;
        let completion = parse_completion(body).expect("completion");
        assert_eq!(completion.content.as_deref(), Some("Hello!"));
        assert!(completion.tool_calls.is_empty());
    }

    #[test]
    fn parses_tool_calls() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "get_outstanding_invoices", "arguments": "{\"user_id\":\"+1415\"}" }
                    }]
                }
            }]
        })
        .to_string();

        let completion = parse_completion(&body).expect("completion");
        assert_eq!(completion.content, None);
        assert_eq!(completion.tool_calls.len(), 1);
        let call = &completion.tool_calls[0];
        assert_eq!(call.function.name, "get_outstanding_invoices");
        assert_eq!(call.arguments().expect("args"), json!({ "user_id": "+1415" }));
    }

    #[test]
    fn empty_choices_are_a_parse_error() {
        let error = parse_completion(r#"{"choices":[]}"#).expect_err("no choices");
        assert_eq!(error.kind, LlmErrorKind::Parse);
    }

    #[test]
    fn status_classification_drives_retries() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(503), LlmErrorKind::Server);
        assert_eq!(classify_http_status(401), LlmErrorKind::Client);
        assert!(LlmError::from_status(502, "bad gateway", None).is_transient());
        assert!(!LlmError::from_status(400, "bad request", None).is_transient());
    }

    #[test]
    fn backoff_is_linear_and_honours_retry_after() {
        let error = LlmError::new(LlmErrorKind::Network, "reset");
        assert_eq!(error.suggested_delay(0), Duration::from_millis(500));
        assert_eq!(error.suggested_delay(2), Duration::from_millis(1500));

        let limited = LlmError::from_status(429, "slow down", Some(Duration::from_secs(3)));
        assert_eq!(limited.suggested_delay(5), Duration::from_secs(3));
    }

    #[test]
    fn request_body_carries_tools_in_function_format() {
        let client = OpenAiCompatibleClient::from_config(&ollama_config()).expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");

        let request = CompletionRequest {
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            tools: vec![ToolDefinition {
                name: "get_available_cards".to_string(),
                description: "List cards".to_string(),
                parameters: json!({ "type": "object" }),
            }],
        };
        let body = client.request_body(&request);

        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["messages"][1], json!({ "role": "user", "content": "hi" }));
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_available_cards");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn tool_messages_serialize_with_call_ids() {
        let call = ToolCall::new("call_9", "make_payment", "");
        let assistant = serde_json::to_value(ChatMessage::assistant_tool_calls(None, vec![call]))
            .expect("serialize");
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(assistant["content"], serde_json::Value::Null);

        let result = serde_json::to_value(ChatMessage::tool_result("call_9", "{}")).expect("serialize");
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_9");
    }
}
