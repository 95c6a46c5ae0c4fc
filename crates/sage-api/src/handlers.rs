//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path parameters and JSON bodies via axum
//! extractors, calls into the chat orchestrator, and returns JSON.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sage_chat::{ConversationLog, TranscriptEntry};
use sage_core::types::Category;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    /// Completion-service key for this session. Falls back to the
    /// server's configured key when absent.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    /// Whether sessions can be opened without supplying a key.
    pub default_api_key: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub category: Category,
}

/// One transcript line as sent to the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl From<&TranscriptEntry> for MessageView {
    fn from(entry: &TranscriptEntry) -> Self {
        Self {
            role: entry.role().to_string(),
            content: entry.content().to_string(),
            created_at: entry.created_at().to_rfc3339(),
        }
    }
}

fn messages(log: &ConversationLog) -> Vec<MessageView> {
    log.iter().map(MessageView::from).collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub category: Category,
    pub answer: String,
    pub messages: Vec<MessageView>,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - liveness and basic counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.session_count(),
        default_api_key: state.orchestrator.has_default_api_key(),
    })
}

/// GET / - serve the self-contained chat page.
pub async fn ui() -> impl IntoResponse {
    Html(crate::ui::INDEX_HTML)
}

/// POST /classify - show which handler a question would be routed to.
///
/// Needs no session and makes no outbound call.
pub async fn classify(
    State(state): State<AppState>,
    Json(body): Json<QuestionRequest>,
) -> Json<ClassifyResponse> {
    let category = state.orchestrator.classifier().classify(body.question.trim());
    Json(ClassifyResponse { category })
}

/// POST /sessions - open a session bound to an API key.
pub async fn open_session(
    State(state): State<AppState>,
    Json(body): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let (session_id, log) = state.orchestrator.open_session(body.api_key.as_deref())?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            messages: messages(&log),
        }),
    ))
}

/// GET /sessions/{id}/messages - the session transcript.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let log = state.orchestrator.history(session_id).await?;
    Ok(Json(SessionResponse {
        session_id,
        messages: messages(&log),
    }))
}

/// POST /sessions/{id}/messages - submit a question and wait for the answer.
pub async fn ask(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let (reply, log) = state.orchestrator.ask(session_id, &body.question).await?;
    Ok(Json(AnswerResponse {
        category: reply.category,
        answer: reply.answer,
        messages: messages(&log),
    }))
}

/// DELETE /sessions/{id} - end a session.
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.close_session(session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
