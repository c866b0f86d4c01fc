//! Trailing-silence end-of-turn detection.
//!
//! Every committed fragment re-arms a single timer; when the timer runs out
//! with something said, the speaker's turn is over.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Silence window for one-shot listening
pub const SINGLE_SHOT_WINDOW: Duration = Duration::from_millis(1500);

/// Silence window for conversational turn-taking
pub const CONVERSATIONAL_WINDOW: Duration = Duration::from_millis(2000);

/// Decides when the candidate has finished speaking.
pub struct SilenceDetector {
    /// Trailing silence required to end a turn
    window: Duration,

    /// When the pending timer expires, if one is armed
    deadline: Option<Instant>,

    /// Whether end-of-turn has already been declared for this session
    fired: bool,
}

impl SilenceDetector {
    pub fn new(window: Duration) -> Self {
        debug!("SilenceDetector created: window={}ms", window.as_millis());
        Self {
            window,
            deadline: None,
            fired: false,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// A committed fragment arrived: restart the countdown.
    pub fn on_final_segment(&mut self) {
        if self.fired {
            return;
        }
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Disarm the timer (session stopped, errored, or superseded).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the armed timer expires. Never resolves while disarmed.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Handle timer expiry. Returns `true` exactly once per session, and only
    /// if the accumulated transcript has content.
    pub fn on_timeout(&mut self, transcript: &str) -> bool {
        self.deadline = None;
        if self.fired || transcript.trim().is_empty() {
            return false;
        }
        self.fired = true;
        debug!(
            "End of turn after {}ms of silence",
            self.window.as_millis()
        );
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
