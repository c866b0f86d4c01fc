use crate::interview::{InterviewConfig, InterviewSession, SessionFactory};
use crate::llm::CodeEvaluator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Interviews by id, kept after they end so results stay queryable
    pub sessions: Arc<RwLock<HashMap<String, Arc<InterviewSession>>>>,

    /// Builds speech engines and services for each new interview
    pub factory: Arc<dyn SessionFactory>,

    pub evaluator: Arc<dyn CodeEvaluator>,

    pub interview: InterviewConfig,
}

impl AppState {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        evaluator: Arc<dyn CodeEvaluator>,
        interview: InterviewConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            factory,
            evaluator,
            interview,
        }
    }

    pub async fn session(&self, id: &str) -> Option<Arc<InterviewSession>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Tear down every interview that is still running
    pub async fn shutdown_all(&self) {
        let sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let running: Vec<_> = sessions.into_iter().filter(|s| !s.is_finished()).collect();
        if running.is_empty() {
            return;
        }

        info!("Shutting down {} running interview(s)", running.len());
        for session in running {
            session.shutdown().await;
        }
    }
}
