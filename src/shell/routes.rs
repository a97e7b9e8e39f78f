//! HTTP endpoints for the chat widget.
//!
//! The server keeps no sessions: each turn carries the session value the
//! previous response returned.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::intake::{
    AssistantReply, Attachment, ConversationSession, FlowController, UserInput, Workflow,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct IntakeState {
    pub controller: Arc<FlowController>,
}

/// Build the Axum router with the intake REST routes.
pub fn intake_routes(controller: Arc<FlowController>) -> Router {
    let state = IntakeState { controller };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/intake/turn", post(turn))
        .route("/api/intake/feedback", post(feedback))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

// ── Turns ───────────────────────────────────────────────────────────────

/// File as sent by the widget, base64 encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAttachment {
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

impl WireAttachment {
    fn decode(self) -> Result<Attachment, String> {
        let data = BASE64
            .decode(self.data.trim())
            .map_err(|e| format!("Invalid attachment data: {e}"))?;
        Ok(match self.mime_type.filter(|m| !m.is_empty()) {
            Some(mime) => Attachment::new(self.name, mime, data),
            None => Attachment::from_bytes(self.name, data),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    #[serde(default)]
    session: Option<ConversationSession>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    attachment: Option<WireAttachment>,
    /// Jump straight into a workflow instead of sending a chat turn.
    #[serde(default)]
    workflow: Option<Workflow>,
}

#[derive(Debug, Serialize)]
struct TurnResponse {
    session: ConversationSession,
    reply: AssistantReply,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message.into()})),
    )
        .into_response()
}

async fn turn(State(state): State<IntakeState>, Json(body): Json<TurnRequest>) -> Response {
    let mut session = body.session.unwrap_or_default();

    let reply = if let Some(workflow) = body.workflow {
        state.controller.start_flow(&mut session, workflow)
    } else {
        let file = match body.attachment.map(WireAttachment::decode).transpose() {
            Ok(file) => file,
            Err(e) => return bad_request(e),
        };
        debug!(
            session = %session.id(),
            with_file = file.is_some(),
            "Intake turn"
        );
        let input = UserInput::from_parts(body.text, file);
        state.controller.handle_user_turn(&mut session, input).await
    };

    (StatusCode::OK, Json(TurnResponse { session, reply })).into_response()
}

// ── Feedback ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    prompt: String,
    rating: u8,
}

async fn feedback(
    State(state): State<IntakeState>,
    Json(body): Json<FeedbackRequest>,
) -> Response {
    if !(1..=5).contains(&body.rating) {
        return bad_request("Rating must be between 1 and 5");
    }
    if body.prompt.trim().is_empty() {
        return bad_request("Prompt is required");
    }
    state.controller.send_feedback(&body.prompt, body.rating).await;
    StatusCode::ACCEPTED.into_response()
}
