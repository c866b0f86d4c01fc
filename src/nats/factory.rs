use super::client::NatsClient;
use super::engines::{NatsRecognitionEngine, NatsSynthesisEngine};
use crate::interview::{Collaborators, SessionFactory, SharedServices};
use crate::speech::{PermissionState, StaticPermission};
use anyhow::Result;
use std::sync::Arc;

/// Builds interviews whose microphone and speaker live on a remote voice client
///
/// The voice client negotiates microphone access itself and reports a
/// refusal as a `not-allowed` recognition error, so the local permission
/// surface starts out granted.
pub struct NatsSessionFactory {
    client: Arc<NatsClient>,
    services: SharedServices,
}

impl NatsSessionFactory {
    pub fn new(client: Arc<NatsClient>, services: SharedServices) -> Self {
        Self { client, services }
    }
}

#[async_trait::async_trait]
impl SessionFactory for NatsSessionFactory {
    async fn collaborators(&self, interview_id: &str) -> Result<Collaborators> {
        let language = self.services.output.language.clone();
        let recognizer = Arc::new(NatsRecognitionEngine::new(
            Arc::clone(&self.client),
            interview_id,
            language,
        ));
        let synthesizer = Arc::new(NatsSynthesisEngine::new(
            Arc::clone(&self.client),
            interview_id,
        ));
        let permission = Arc::new(StaticPermission::new(PermissionState::Granted));

        Ok(self.services.assemble(recognizer, synthesizer, permission))
    }
}
