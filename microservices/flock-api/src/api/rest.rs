//! Flock API REST surface
//!
//! Every response shares the envelope: success payloads carry
//! `"error": false`, failures are `{"error": true, "error_msg"}` with 400,
//! and auth failures are an empty 401.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use flock_core::FlockError;

use crate::auth::{self, CredentialGate};
use crate::domain::{principal, NotificationEvent, Principal};
use crate::infrastructure::PrincipalStore;
use crate::pipeline::SubmissionPipeline;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<CredentialGate>,
    pub principals: Arc<dyn PrincipalStore>,
    pub pipeline: Arc<SubmissionPipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Probes
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Registration
        .route("/register", post(register))
        // Authenticated ingestion
        .route("/ping", get(ping))
        .route("/submit", post(submit))
        .route("/submit_flock_logs", post(submit_flock_logs))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

async fn register(State(state): State<AppState>, body: String) -> Response {
    let Ok(request) = serde_json::from_str::<Value>(&body) else {
        return api_error("Invalid JSON object");
    };
    if !request.is_object() {
        return api_error("Invalid JSON object");
    }

    let username = request.get("username").and_then(Value::as_str).unwrap_or("");
    if username.is_empty() {
        return api_error("You must provide a username");
    }
    if !principal::username_is_valid(username) {
        return api_error("Usernames must only contain letters, numbers, '-', or '_'");
    }

    let name = principal::sanitize_display_name(
        request.get("name").and_then(Value::as_str).unwrap_or(""),
    );

    let new_principal = Principal {
        username: username.to_string(),
        name: name.clone(),
        token: auth::generate_token(),
    };
    let token = new_principal.token.clone();

    match state.principals.insert(new_principal).await {
        Ok(()) => {
            let event = NotificationEvent::details(
                "user_registered",
                json!({"username": username, "name": name}),
            );
            state.pipeline.notify(&event).await;
            api_success(json!({"auth_token": token}))
        }
        Err(FlockError::Duplicate(_)) => {
            let event = NotificationEvent::details(
                "user_already_exists",
                json!({"username": username, "name": name}),
            );
            state.pipeline.notify(&event).await;
            api_error(&format!(
                "Your computer ({username}) is already registered with this server"
            ))
        }
        Err(_) => api_error("Registration failed"),
    }
}

async fn ping(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match require_auth(&state, &headers).await {
        Ok(_) => api_success(json!({})),
        Err(response) => response,
    }
}

async fn submit(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let submitter = match require_auth(&state, &headers).await {
        Ok(submitter) => submitter,
        Err(response) => return response,
    };

    let Ok(docs) = serde_json::from_str::<Value>(&body) else {
        return api_error("Invalid JSON object");
    };

    match state.pipeline.process_telemetry(&docs, &submitter).await {
        Ok(count) => api_success(json!({"processed_count": count})),
        Err(e) => pipeline_error(e),
    }
}

async fn submit_flock_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let submitter = match require_auth(&state, &headers).await {
        Ok(submitter) => submitter,
        Err(response) => return response,
    };

    let Ok(docs) = serde_json::from_str::<Value>(&body) else {
        return api_error("Invalid JSON object");
    };

    match state.pipeline.process_flock_logs(&docs, &submitter).await {
        Ok(count) => api_success(json!({"processed_count": count})),
        Err(e) => pipeline_error(e),
    }
}

/// Resolve the Basic credentials into a principal, or an empty 401
async fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<Principal, Response> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(unauthorized)?;
    let (username, secret) = auth::parse_basic_auth(header).ok_or_else(unauthorized)?;

    if !state.gate.authenticate(&username, &secret).await {
        return Err(unauthorized());
    }
    state.gate.principal(&username).await.ok_or_else(unauthorized)
}

fn unauthorized() -> Response {
    StatusCode::UNAUTHORIZED.into_response()
}

fn api_error(error_msg: &str) -> Response {
    debug!(error_msg, "API error");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": true, "error_msg": error_msg})),
    )
        .into_response()
}

fn api_success(mut payload: Value) -> Response {
    if let Some(fields) = payload.as_object_mut() {
        fields.insert("error".to_string(), Value::Bool(false));
    }
    (StatusCode::OK, Json(payload)).into_response()
}

/// Validation failures surface their message; anything else is a generic
/// submission failure (the client never learns dispatch details).
fn pipeline_error(error: FlockError) -> Response {
    match error {
        FlockError::Validation(message) => api_error(&message),
        other => {
            debug!(error = %other, "Submission failed");
            api_error("Submission failed")
        }
    }
}
