use super::engine::{SpokenUtterance, SynthesisEngine, SynthesisErrorKind, SynthesisEvent};
use super::session::{SessionGuard, SessionMode, SessionSlot, SpeechSession};
use crate::error::SpeechError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Invoked after an interruptible utterance was cut off by the user
pub type InterruptCallback = Arc<dyn Fn() + Send + Sync>;

/// Voice and timing parameters for speech output
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Lower bound for the playback safety timeout
    pub min_timeout: Duration,
    /// Safety timeout budget per character of text
    pub per_char_timeout: Duration,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            min_timeout: Duration::from_secs(10),
            per_char_timeout: Duration::from_millis(100),
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
            language: "en-US".to_string(),
        }
    }
}

impl OutputConfig {
    /// How long playback of `text` may take before it is forcibly ended
    pub fn timeout_for(&self, text: &str) -> Duration {
        let scaled = self.per_char_timeout * text.chars().count() as u32;
        scaled.max(self.min_timeout)
    }
}

/// How a `speak` call settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Playback reached its natural end
    Completed,
    /// The user interrupted playback
    Interrupted,
    /// A newer utterance or an explicit stop replaced this one
    Cancelled,
    /// The engine never reported an end; playback was cancelled
    TimedOut,
}

/// Text-to-speech adapter: one utterance at a time, cooperative interruption,
/// and a safety timeout so a hung engine cannot stall the interview.
pub struct SpeechOutput {
    engine: Arc<dyn SynthesisEngine>,
    config: OutputConfig,
    slot: SessionSlot,
    /// Session id most recently ended by `interrupt`
    interrupted_id: AtomicU64,
    on_interrupt: Mutex<Option<InterruptCallback>>,
}

impl SpeechOutput {
    pub fn new(engine: Arc<dyn SynthesisEngine>, config: OutputConfig) -> Self {
        Self {
            engine,
            config,
            slot: SessionSlot::new(SessionMode::Speaking),
            interrupted_id: AtomicU64::new(0),
            on_interrupt: Mutex::new(None),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    pub fn set_interrupt_callback(&self, callback: InterruptCallback) {
        if let Ok(mut slot) = self.on_interrupt.lock() {
            *slot = Some(callback);
        }
    }

    /// Speak `text`, cancelling whatever was playing before.
    ///
    /// Interruption, cancellation and timeout all settle as `Ok`; only a
    /// genuine synthesis failure is an error.
    pub async fn speak(&self, text: &str, interruptible: bool) -> Result<SpeakOutcome, SpeechError> {
        if !self.engine.is_supported() {
            return Err(SpeechError::CapabilityUnavailable(
                "speech synthesis".to_string(),
            ));
        }

        self.stop();

        let ticket = self.slot.begin(interruptible);
        let engine = &self.engine;
        let guard = SessionGuard::new(&self.slot, ticket.id, move || engine.cancel());

        let utterance = SpokenUtterance {
            id: uuid::Uuid::new_v4(),
            text: text.to_string(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            volume: self.config.volume,
            language: self.config.language.clone(),
        };
        let timeout = self.config.timeout_for(text);
        let deadline = Instant::now() + timeout;

        debug!(
            "Speaking utterance {} via {} ({} chars, timeout {}ms, interruptible={})",
            utterance.id,
            self.engine.name(),
            text.chars().count(),
            timeout.as_millis(),
            interruptible
        );

        let mut events = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => {
                guard.complete();
                return Ok(self.cancelled_outcome(ticket.id));
            }
            started = self.engine.speak(utterance) => started?,
        };

        let outcome = loop {
            tokio::select! {
                biased;
                _ = ticket.token.cancelled() => {
                    break Ok(self.cancelled_outcome(ticket.id));
                }
                _ = tokio::time::sleep_until(deadline) => {
                    warn!("Speech timeout reached after {}ms", timeout.as_millis());
                    self.engine.cancel();
                    break Ok(SpeakOutcome::TimedOut);
                }
                event = events.recv() => match event {
                    Some(SynthesisEvent::Start) => debug!("Speech started"),
                    Some(SynthesisEvent::End) | None => break Ok(SpeakOutcome::Completed),
                    Some(SynthesisEvent::Error(SynthesisErrorKind::Interrupted))
                    | Some(SynthesisEvent::Error(SynthesisErrorKind::Canceled)) => {
                        break Ok(self.cancelled_outcome(ticket.id));
                    }
                    Some(SynthesisEvent::Error(SynthesisErrorKind::Other(reason))) => {
                        warn!("Speech synthesis error: {}", reason);
                        break Err(SpeechError::Synthesis(reason));
                    }
                },
            }
        };

        guard.complete();
        outcome
    }

    /// Cut off the current utterance if it allows interruption.
    ///
    /// Returns whether anything was interrupted.
    pub fn interrupt(&self) -> bool {
        let interrupted = self.slot.cancel_if(|current| {
            if !current.interruptible {
                return false;
            }
            // Recorded before the token fires so `speak` reports Interrupted
            self.interrupted_id.store(current.id, Ordering::SeqCst);
            true
        });
        if interrupted.is_none() {
            return false;
        }
        self.engine.cancel();
        info!("Speech interrupted by user");

        let callback = self.on_interrupt.lock().ok().and_then(|c| c.clone());
        if let Some(callback) = callback {
            callback();
        }
        true
    }

    /// Cancel playback unconditionally. Safe to call when idle.
    pub fn stop(&self) {
        if let Some(session) = self.slot.cancel_current() {
            debug!("Stopping speech session {}", session.id);
            self.engine.cancel();
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.slot.is_active()
    }

    pub fn current_session(&self) -> Option<SpeechSession> {
        self.slot.current()
    }

    fn cancelled_outcome(&self, id: u64) -> SpeakOutcome {
        if self.interrupted_id.load(Ordering::SeqCst) == id {
            SpeakOutcome::Interrupted
        } else {
            SpeakOutcome::Cancelled
        }
    }
}
