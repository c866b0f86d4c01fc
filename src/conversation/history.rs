use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Interviewer,
    Candidate,
}

/// One line of the interview transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurnRecord {
    pub speaker: Speaker,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of everything said during one interview
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    records: Vec<ConversationTurnRecord>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, message: impl Into<String>) {
        self.records.push(ConversationTurnRecord {
            speaker,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn records(&self) -> &[ConversationTurnRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Messages from one speaker, oldest first
    pub fn messages_from(&self, speaker: Speaker) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(move |r| r.speaker == speaker)
            .map(|r| r.message.as_str())
    }
}
