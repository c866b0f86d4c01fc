use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Who is being interviewed, for what
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewSettings {
    pub company: String,

    pub role: String,

    /// "technical", "behavioral", "system-design", ...
    #[serde(alias = "type")]
    pub interview_type: String,

    pub difficulty: String,

    pub candidate_name: String,

    /// Owner of the persisted interview row, if the candidate is signed in
    pub user_id: Option<String>,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            company: "Tech Company".to_string(),
            role: "Software Engineer".to_string(),
            interview_type: "technical".to_string(),
            difficulty: "medium".to_string(),
            candidate_name: "Candidate".to_string(),
            user_id: None,
        }
    }
}

/// Turn-taking parameters for the interview controller
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    /// Question budget
    /// Default: 5
    pub max_questions: usize,

    /// Pause between the end of our speech and opening the microphone
    pub post_speech_delay: Duration,

    /// Consecutive empty turns before a gentle re-prompt
    pub silent_turn_limit: usize,

    /// How long a notice stays visible
    pub notice_ttl: Duration,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_questions: 5,
            post_speech_delay: Duration::from_millis(1000),
            silent_turn_limit: 3,
            notice_ttl: Duration::from_secs(5),
        }
    }
}
