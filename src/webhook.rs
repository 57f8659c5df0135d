//! Inbound GitLab webhook endpoint
//!
//! - POST /handle_gitlab_events - GitLab merge request and issue hooks
//! - GET  /health - Health check

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{
    event::{GitlabEvent, ObjectAttributes},
    workflow::Workflow,
};

const TOKEN_HEADER: &str = "X-Gitlab-Token";

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Workflow,
}

impl AppState {
    pub fn new(workflow: Workflow) -> Self {
        Self { workflow }
    }
}

/// Create the router with all routes and request tracing
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/handle_gitlab_events", post(handle_gitlab_events))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle a GitLab webhook delivery.
///
/// Rejections happen before any work is done; once a delivery is accepted
/// the response is 200 whatever GitLab answers to the follow-up calls.
pub async fn handle_gitlab_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if let Some(secret) = &state.workflow.config().secret_token {
        let token = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
        if token != Some(secret.as_str()) {
            warn!("Rejected webhook with missing or wrong token");
            return Err(StatusCode::FORBIDDEN);
        }
    }

    let event_header = headers
        .get(GitlabEvent::HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let event = GitlabEvent::from_header(event_header)
        .filter(GitlabEvent::is_handled)
        .ok_or_else(|| {
            warn!(event_type = %event_header, "Unsupported webhook event");
            StatusCode::BAD_REQUEST
        })?;

    let attributes = ObjectAttributes::from_payload(&body).map_err(|e| {
        warn!(event_type = %event_header, error = %e, "Invalid webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    info!(
        event_type = %event_header,
        action = attributes.action.as_deref().unwrap_or("none"),
        "Received GitLab webhook"
    );

    let workflow_event = attributes.into_workflow_event(event).map_err(|e| {
        warn!(event_type = %event_header, error = %e, "Invalid webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    match workflow_event {
        Some(workflow_event) => state.workflow.handle(workflow_event).await,
        None => debug!(event_type = %event_header, "Nothing to do for this action"),
    }

    Ok(Json(json!({ "status": "ok" })))
}
