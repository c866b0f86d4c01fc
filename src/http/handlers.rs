use super::state::AppState;
use crate::error::SpeechError;
use crate::interview::{
    ConversationTurnRecord, InterviewSession, InterviewSettings, InterviewStatus,
};
use crate::llm::{ProblemSpec, TestCase};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// Optional interview ID (if not provided, generate UUID)
    pub interview_id: Option<String>,

    #[serde(flatten)]
    pub settings: InterviewSettings,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InterruptResponse {
    pub interrupted: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub granted: bool,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub code: String,
    #[serde(default)]
    pub problem: ProblemSpec,
    #[serde(default, alias = "testCases")]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn not_found(interview_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview {} not found", interview_id),
    )
}

fn refusal_status(err: &SpeechError) -> StatusCode {
    match err {
        SpeechError::PermissionDenied => StatusCode::FORBIDDEN,
        SpeechError::CapabilityUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews/start
/// Create an interview and start it in the background
///
/// An interview that was refused (for example on a microphone denial) stays
/// registered as not started; starting the same id again retries it.
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Response {
    let interview_id = req
        .interview_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    if let Some(existing) = state.session(&interview_id).await {
        if existing.snapshot().status != InterviewStatus::NotStarted {
            return already_exists(&interview_id);
        }
        info!("Retrying start of interview: {}", interview_id);
        return launch(&interview_id, &existing).await;
    }

    info!("Starting interview: {}", interview_id);

    let collaborators = match state.factory.collaborators(&interview_id).await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to set up interview {}: {:#}", interview_id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to set up interview: {}", e),
            );
        }
    };

    let session = InterviewSession::new(
        interview_id.clone(),
        req.settings,
        state.interview.clone(),
        collaborators,
    );

    {
        let mut sessions = state.sessions.write().await;
        if sessions.contains_key(&interview_id) {
            return already_exists(&interview_id);
        }
        sessions.insert(interview_id.clone(), Arc::clone(&session));
    }

    launch(&interview_id, &session).await
}

async fn launch(interview_id: &str, session: &Arc<InterviewSession>) -> Response {
    if let Err(e) = session.start().await {
        warn!("Interview {} refused to start: {}", interview_id, e);
        return error_response(refusal_status(&e), e.user_message());
    }

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            interview_id: interview_id.to_string(),
            status: "in_progress".to_string(),
            message: format!("Interview {} started", interview_id),
        }),
    )
        .into_response()
}

fn already_exists(interview_id: &str) -> Response {
    error_response(
        StatusCode::CONFLICT,
        format!("Interview {} already exists", interview_id),
    )
}

/// POST /interviews/:interview_id/end
/// End the interview early; returns the final snapshot
pub async fn end_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    let Some(session) = state.session(&interview_id).await else {
        return not_found(&interview_id);
    };

    info!("Ending interview: {}", interview_id);
    let snapshot = session.end_call().await;
    (StatusCode::OK, Json(snapshot)).into_response()
}

/// POST /interviews/:interview_id/listen
/// Resume listening after an interruption or a microphone problem
pub async fn resume_listening(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match state.session(&interview_id).await {
        Some(session) => {
            let accepted = session.request_listen();
            (StatusCode::OK, Json(AcceptedResponse { accepted })).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// POST /interviews/:interview_id/interrupt
pub async fn interrupt_speech(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match state.session(&interview_id).await {
        Some(session) => {
            let interrupted = session.interrupt_speech();
            (StatusCode::OK, Json(InterruptResponse { interrupted })).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// POST /interviews/:interview_id/help
pub async fn request_help(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match state.session(&interview_id).await {
        Some(session) => {
            let accepted = session.request_help();
            (StatusCode::OK, Json(AcceptedResponse { accepted })).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// POST /interviews/:interview_id/permission
pub async fn request_permission(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match state.session(&interview_id).await {
        Some(session) => {
            let granted = session.request_microphone_permission().await;
            (StatusCode::OK, Json(PermissionResponse { granted })).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// GET /interviews/:interview_id/status
pub async fn get_interview_status(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match state.session(&interview_id).await {
        Some(session) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        None => not_found(&interview_id),
    }
}

/// GET /interviews/:interview_id/transcript
/// Conversation so far, oldest first
pub async fn get_interview_transcript(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match state.session(&interview_id).await {
        Some(session) => {
            let history: Vec<ConversationTurnRecord> = session.history();
            (StatusCode::OK, Json(history)).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// POST /practice/evaluate
pub async fn evaluate_code(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Response {
    match state
        .evaluator
        .evaluate(&req.code, &req.problem, &req.test_cases)
        .await
    {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(e) => {
            error!("Code evaluation failed: {:#}", e);
            error_response(
                StatusCode::BAD_GATEWAY,
                "Code evaluation is unavailable right now".to_string(),
            )
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
