//! Interview persistence
//!
//! Writes are best-effort from the controller's point of view: it logs
//! failures and carries on in memory.

mod memory;
mod supabase;

pub use memory::MemoryStore;
pub use supabase::{SupabaseConfig, SupabaseStore};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row written when an interview starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInterview {
    pub user_id: Option<String>,
    pub company: String,
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub score: u8,
    pub duration: u64,
    pub status: String,
    pub questions_count: usize,
    pub topics: Vec<String>,
    pub feedback: String,
}

/// Partial update of an interview row; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_asked: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds since the interview started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub interview_id: String,
    pub question: String,
    pub response: String,
    pub ai_feedback: String,
    pub question_number: usize,
}

#[async_trait::async_trait]
pub trait InterviewStore: Send + Sync {
    /// Create the interview row and return its id
    async fn create_interview(&self, interview: NewInterview) -> Result<String>;

    async fn update_interview(&self, id: &str, update: InterviewUpdate) -> Result<()>;

    async fn append_response(&self, record: ResponseRecord) -> Result<()>;
}
