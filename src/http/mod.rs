//! HTTP API server for the interview client
//!
//! This module provides a REST API for driving voice interviews:
//! - POST /interviews/start - Start a new interview
//! - POST /interviews/:id/listen - Resume listening after an interruption
//! - POST /interviews/:id/interrupt - Cut off the interviewer
//! - POST /interviews/:id/help - Ask for a hint
//! - POST /interviews/:id/permission - Re-request microphone access
//! - POST /interviews/:id/end - End the interview early
//! - GET /interviews/:id/status - Live interview state
//! - GET /interviews/:id/transcript - Conversation so far
//! - POST /practice/evaluate - Review a practice-problem solution
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
