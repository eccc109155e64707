//! The conversational endpoint the mobile client talks to.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use telcobot_agent::{welcome_screen, AgentRuntime, SessionId, SharedBillingStore};
use telcobot_core::{ApplicationError, InterfaceError};
use tracing::{error, info};
use uuid::Uuid;

use crate::health;

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Serialize)]
pub struct TalkResponse {
    pub message: Value,
    pub session_id: String,
}

#[derive(Debug, PartialEq)]
struct TalkRequest {
    message: String,
    session_id: Option<String>,
}

pub fn router(runtime: Arc<AgentRuntime>, store: SharedBillingStore) -> Router {
    Router::new()
        .route("/", post(talk))
        .with_state(ApiState { runtime })
        .merge(health::router(store))
}

async fn talk(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "detail": rejection.body_text() })))
                .into_response();
        }
    };
    let request = match validate(&body) {
        Ok(request) => request,
        Err(errors) => return (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
    };

    let Some(session) = SessionId::from_request(request.session_id.as_deref()) else {
        let session = SessionId::generate();
        info!(event_name = "api.session.created", session_id = %session, "new session started");
        return Json(TalkResponse {
            message: welcome_screen().to_value(),
            session_id: session.to_string(),
        })
        .into_response();
    };

    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "api.talk.received",
        correlation_id = %correlation_id,
        session_id = %session,
        "user message received"
    );

    match state.runtime.respond(&session, &request.message).await {
        Ok(response) => {
            info!(
                event_name = "api.talk.completed",
                correlation_id = %correlation_id,
                session_id = %session,
                finished = response.reply.finished,
                "reply rendered"
            );
            Json(TalkResponse { message: response.screen.to_value(), session_id: session.to_string() })
                .into_response()
        }
        Err(agent_error) => {
            error!(
                event_name = "api.talk.failed",
                correlation_id = %correlation_id,
                session_id = %session,
                error = %agent_error,
                "agent turn failed"
            );
            ApiError(ApplicationError::from(agent_error).into_interface(correlation_id)).into_response()
        }
    }
}

/// Field-keyed validation errors, one list of messages per field.
fn validate(body: &Value) -> Result<TalkRequest, Value> {
    let mut errors = Map::new();
    let Some(object) = body.as_object() else {
        return Err(json!({ "non_field_errors": ["Invalid data. Expected a dictionary."] }));
    };

    let message = match char_field(object.get("message"), true) {
        Ok(value) => value,
        Err(problem) => {
            errors.insert("message".to_string(), json!([problem]));
            None
        }
    };
    let session_id = match char_field(object.get("session_id"), false) {
        Ok(value) => value,
        Err(problem) => {
            errors.insert("session_id".to_string(), json!([problem]));
            None
        }
    };

    match message {
        Some(message) if errors.is_empty() => Ok(TalkRequest { message, session_id }),
        _ => Err(Value::Object(errors)),
    }
}

fn char_field(value: Option<&Value>, required: bool) -> Result<Option<String>, &'static str> {
    match value {
        None if required => Err("This field is required."),
        None => Ok(None),
        Some(Value::Null) => Err("This field may not be null."),
        Some(Value::String(text)) if text.trim().is_empty() => Err("This field may not be blank."),
        Some(Value::String(text)) => Ok(Some(text.trim().to_string())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(_) => Err("Not a valid string."),
    }
}

pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": self.0.error_class(),
            "message": self.0.user_message(),
            "correlation_id": self.0.correlation_id(),
        });
        (status, Json(body)).into_response()
    }
}
