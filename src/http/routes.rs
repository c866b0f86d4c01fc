use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route("/interviews/start", post(handlers::start_interview))
        .route("/interviews/:interview_id/end", post(handlers::end_interview))
        // Candidate controls
        .route("/interviews/:interview_id/listen", post(handlers::resume_listening))
        .route(
            "/interviews/:interview_id/interrupt",
            post(handlers::interrupt_speech),
        )
        .route("/interviews/:interview_id/help", post(handlers::request_help))
        .route(
            "/interviews/:interview_id/permission",
            post(handlers::request_permission),
        )
        // Interview queries
        .route(
            "/interviews/:interview_id/status",
            get(handlers::get_interview_status),
        )
        .route(
            "/interviews/:interview_id/transcript",
            get(handlers::get_interview_transcript),
        )
        // Practice problems
        .route("/practice/evaluate", post(handlers::evaluate_code))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
