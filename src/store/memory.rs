use super::{InterviewStore, InterviewUpdate, NewInterview, ResponseRecord};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process store holding rows as JSON objects
///
/// Used when no database is configured, and by tests to inspect what the
/// controller persisted.
#[derive(Default)]
pub struct MemoryStore {
    interviews: RwLock<HashMap<String, Value>>,
    responses: RwLock<Vec<ResponseRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn interview(&self, id: &str) -> Option<Value> {
        self.interviews.read().await.get(id).cloned()
    }

    pub async fn interviews(&self) -> Vec<Value> {
        self.interviews.read().await.values().cloned().collect()
    }

    pub async fn interview_count(&self) -> usize {
        self.interviews.read().await.len()
    }

    /// Responses for one interview, in the order they were written
    pub async fn responses(&self, interview_id: &str) -> Vec<ResponseRecord> {
        self.responses
            .read()
            .await
            .iter()
            .filter(|r| r.interview_id == interview_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl InterviewStore for MemoryStore {
    async fn create_interview(&self, interview: NewInterview) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut row = serde_json::to_value(&interview).context("Failed to encode interview")?;
        if let Value::Object(map) = &mut row {
            map.insert("id".to_string(), Value::String(id.clone()));
            map.insert(
                "created_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }

        self.interviews.write().await.insert(id.clone(), row);
        debug!("Created interview row {}", id);
        Ok(id)
    }

    async fn update_interview(&self, id: &str, update: InterviewUpdate) -> Result<()> {
        let patch = serde_json::to_value(&update).context("Failed to encode update")?;
        let mut interviews = self.interviews.write().await;
        let row = interviews
            .get_mut(id)
            .ok_or_else(|| anyhow!("Interview {} not found", id))?;

        if let (Value::Object(row), Value::Object(patch)) = (row, patch) {
            for (key, value) in patch {
                row.insert(key, value);
            }
        }
        Ok(())
    }

    async fn append_response(&self, record: ResponseRecord) -> Result<()> {
        if !self.interviews.read().await.contains_key(&record.interview_id) {
            return Err(anyhow!("Interview {} not found", record.interview_id));
        }
        self.responses.write().await.push(record);
        Ok(())
    }
}
