use super::scoring::ScoringPolicy;
use super::session::Collaborators;
use crate::conversation::ResponseGenerator;
use crate::llm::QuestionGenerator;
use crate::speech::{
    CaptureConfig, MicrophonePermission, OutputConfig, RecognitionEngine, SpeechCapture,
    SpeechOutput, SynthesisEngine,
};
use crate::store::InterviewStore;
use anyhow::Result;
use std::sync::Arc;

/// Builds the per-interview collaborators
///
/// Implementations:
/// - NATS: engines bound to a remote voice client per interview id
/// - Test fakes: scripted engines
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    async fn collaborators(&self, interview_id: &str) -> Result<Collaborators>;
}

/// Services shared by every interview a process runs
#[derive(Clone)]
pub struct SharedServices {
    pub responder: Arc<ResponseGenerator>,
    pub questions: Arc<dyn QuestionGenerator>,
    pub store: Arc<dyn InterviewStore>,
    pub scoring: Arc<dyn ScoringPolicy>,
    pub output: OutputConfig,
    pub capture: CaptureConfig,
}

impl SharedServices {
    /// Wire one interview's speech engines to the shared services
    pub fn assemble(
        &self,
        recognizer: Arc<dyn RecognitionEngine>,
        synthesizer: Arc<dyn SynthesisEngine>,
        permission: Arc<dyn MicrophonePermission>,
    ) -> Collaborators {
        let output = Arc::new(SpeechOutput::new(synthesizer, self.output.clone()));
        let capture = Arc::new(SpeechCapture::new(
            recognizer,
            Arc::clone(&output),
            self.capture.clone(),
        ));

        Collaborators {
            output,
            capture,
            permission,
            responder: Arc::clone(&self.responder),
            questions: Arc::clone(&self.questions),
            store: Arc::clone(&self.store),
            scoring: Arc::clone(&self.scoring),
        }
    }
}
