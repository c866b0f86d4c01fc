use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    NotStarted,
    InProgress,
    Completed,
    EndedEarly,
}

impl InterviewStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, InterviewStatus::Completed | InterviewStatus::EndedEarly)
    }

    /// Value stored in the interview row's `status` column
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::NotStarted => "not_started",
            InterviewStatus::InProgress => "in_progress",
            InterviewStatus::Completed => "completed",
            InterviewStatus::EndedEarly => "ended_early",
        }
    }
}

/// Where the controller is in the turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    Greeting,
    AskingQuestion,
    SpeakingQuestion,
    ListeningForAnswer,
    GeneratingResponse,
    SpeakingResponse,
    Ending,
    Ended,
}

/// A dismissible message for the candidate
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub posted_at: Instant,
}

/// Mutable controller state, guarded by the session
#[derive(Debug, Clone)]
pub struct InterviewState {
    pub status: InterviewStatus,
    pub phase: TurnPhase,
    /// Questions asked so far
    pub question_index: usize,
    pub asked_questions: Vec<String>,
    pub current_question: Option<String>,
    /// Set after an interruption or blocking error; cleared by a listen request
    pub awaiting_listen: bool,
    pub notice: Option<Notice>,
    pub score: Option<u8>,
    /// Id of the persisted interview row, if creation succeeded
    pub record_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for InterviewState {
    fn default() -> Self {
        Self {
            status: InterviewStatus::NotStarted,
            phase: TurnPhase::Idle,
            question_index: 0,
            asked_questions: Vec::new(),
            current_question: None,
            awaiting_listen: false,
            notice: None,
            score: None,
            record_id: None,
            started_at: None,
        }
    }
}

/// Point-in-time view of an interview for the UI
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSnapshot {
    pub id: String,
    pub status: InterviewStatus,
    pub phase: TurnPhase,
    pub question_index: usize,
    pub max_questions: usize,
    pub current_question: Option<String>,
    pub is_speaking: bool,
    pub is_listening: bool,
    pub awaiting_listen: bool,
    pub partial_transcript: String,
    pub notice: Option<String>,
    pub score: Option<u8>,
}
