//! Interview turn controller
//!
//! This module provides the `InterviewSession` state machine that manages:
//! - Greeting, question, answer and response turns
//! - Explicit help, interrupt and early-end controls
//! - Best-effort persistence of the interview and each answer
//! - Final scoring and the live snapshot shown to the candidate

mod config;
mod factory;
pub mod messages;
mod scoring;
mod session;
mod state;

pub use crate::conversation::{ConversationHistory, ConversationTurnRecord, Speaker};
pub use config::{InterviewConfig, InterviewSettings};
pub use factory::{SessionFactory, SharedServices};
pub use scoring::{CompletionScore, ScoringPolicy};
pub use session::{Collaborators, InterviewSession};
pub use state::{InterviewSnapshot, InterviewState, InterviewStatus, Notice, TurnPhase};
