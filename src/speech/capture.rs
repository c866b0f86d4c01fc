use super::engine::{RecognitionEngine, RecognitionEvent};
use super::output::SpeechOutput;
use super::session::{SessionGuard, SessionMode, SessionSlot, SpeechSession};
use super::silence::{SilenceDetector, CONVERSATIONAL_WINDOW, SINGLE_SHOT_WINDOW};
use super::transcript::Utterance;
use crate::error::SpeechError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receives committed + tentative text while the candidate is talking
pub type PartialCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Listening entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    /// One-shot capture. Refuses to start while another session is active.
    Single,
    /// Turn-taking capture. Replaces any active session.
    Conversational,
}

/// Silence windows and self-capture grace periods per listening mode
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub single_window: Duration,
    pub conversational_window: Duration,
    /// Wait after stopping speech output before the microphone opens
    pub single_grace: Duration,
    pub conversational_grace: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            single_window: SINGLE_SHOT_WINDOW,
            conversational_window: CONVERSATIONAL_WINDOW,
            single_grace: Duration::from_millis(500),
            conversational_grace: Duration::from_millis(300),
        }
    }
}

impl CaptureConfig {
    pub fn window(&self, mode: ListenMode) -> Duration {
        match mode {
            ListenMode::Single => self.single_window,
            ListenMode::Conversational => self.conversational_window,
        }
    }

    pub fn grace(&self, mode: ListenMode) -> Duration {
        match mode {
            ListenMode::Single => self.single_grace,
            ListenMode::Conversational => self.conversational_grace,
        }
    }
}

/// Speech-to-text adapter that turns a continuous recognizer into
/// "listen until the candidate stops talking"
pub struct SpeechCapture {
    engine: Arc<dyn RecognitionEngine>,
    output: Arc<SpeechOutput>,
    config: CaptureConfig,
    slot: SessionSlot,
}

impl SpeechCapture {
    pub fn new(
        engine: Arc<dyn RecognitionEngine>,
        output: Arc<SpeechOutput>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            engine,
            output,
            config,
            slot: SessionSlot::new(SessionMode::Listening),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    /// Listen until end-of-turn and return the trimmed transcript.
    ///
    /// Resolves with an empty string when the engine ends on its own without
    /// any committed speech. `stop_listening` resolves the pending call with
    /// whatever was committed so far.
    pub async fn listen(
        &self,
        mode: ListenMode,
        on_partial: Option<PartialCallback>,
    ) -> Result<String, SpeechError> {
        if !self.engine.is_supported() {
            return Err(SpeechError::CapabilityUnavailable(
                "streaming speech recognition".to_string(),
            ));
        }

        if self.slot.is_active() {
            match mode {
                ListenMode::Single => return Err(SpeechError::AlreadyListening),
                ListenMode::Conversational => {
                    info!("Replacing active listening session");
                    self.stop_listening();
                }
            }
        }

        // Keep the microphone from picking up the tail of our own speech
        self.output.stop();

        let ticket = self.slot.begin(false);
        let engine = &self.engine;
        let guard = SessionGuard::new(&self.slot, ticket.id, move || engine.stop());

        tokio::select! {
            biased;
            _ = ticket.token.cancelled() => {
                guard.complete();
                return Ok(String::new());
            }
            _ = tokio::time::sleep(self.config.grace(mode)) => {}
        }

        let mut events = self.engine.start().await?;
        info!("Listening via {} ({:?})", self.engine.name(), mode);

        let mut utterance = Utterance::new();
        let mut detector = SilenceDetector::new(self.config.window(mode));

        let result = loop {
            tokio::select! {
                biased;
                _ = ticket.token.cancelled() => {
                    detector.cancel();
                    debug!("Listening cancelled");
                    break Ok(utterance.finalize());
                }
                _ = detector.expired() => {
                    if detector.on_timeout(&utterance.text) {
                        self.engine.stop();
                        break Ok(utterance.finalize());
                    }
                }
                event = events.recv() => match event {
                    Some(RecognitionEvent::Results { result_index, results }) => {
                        let delta = utterance.apply(result_index, &results);
                        if !delta.is_empty() {
                            if let Some(callback) = &on_partial {
                                callback(&utterance.live_text());
                            }
                        }
                        if delta.has_final() {
                            detector.on_final_segment();
                        }
                    }
                    Some(RecognitionEvent::Error(kind)) => {
                        detector.cancel();
                        warn!("Speech recognition error: {:?}", kind);
                        self.engine.stop();
                        break Err(SpeechError::from(kind));
                    }
                    Some(RecognitionEvent::End) | None => {
                        detector.cancel();
                        debug!("Recognizer ended on its own");
                        break Ok(utterance.finalize());
                    }
                },
            }
        };

        guard.complete();

        if let Ok(text) = &result {
            info!("Speech recognized: {:?}", text);
        }
        result
    }

    /// Hard-cancel the active listening session. Idempotent.
    pub fn stop_listening(&self) -> bool {
        match self.slot.cancel_current() {
            Some(session) => {
                debug!("Stopping listening session {}", session.id);
                self.engine.stop();
                true
            }
            None => false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.slot.is_active()
    }

    pub fn current_session(&self) -> Option<SpeechSession> {
        self.slot.current()
    }
}
