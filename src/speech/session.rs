use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What a speech session is doing with the audio devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Listening,
    Speaking,
    Idle,
}

/// One listen-or-speak operation
#[derive(Debug, Clone, Serialize)]
pub struct SpeechSession {
    pub id: u64,
    pub mode: SessionMode,
    pub interruptible: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

struct ActiveSession {
    session: SpeechSession,
    token: CancellationToken,
}

/// Handle returned when a session begins
///
/// Engine callbacks check `token` before touching state, so a superseded
/// session can never mutate the one that replaced it.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    pub id: u64,
    pub token: CancellationToken,
}

/// Holds at most one active session of a given mode
pub struct SessionSlot {
    mode: SessionMode,
    next_id: AtomicU64,
    active: Mutex<Option<ActiveSession>>,
    last_ended: Mutex<Option<SpeechSession>>,
}

impl SessionSlot {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
            last_ended: Mutex::new(None),
        }
    }

    /// Start a new session, cancelling the previous one if any
    pub fn begin(&self, interruptible: bool) -> SessionTicket {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        let session = SpeechSession {
            id,
            mode: self.mode,
            interruptible,
            started_at: Utc::now(),
            ended_at: None,
        };

        let previous = self.lock_active().replace(ActiveSession {
            session,
            token: token.clone(),
        });
        if let Some(prev) = previous {
            debug!("{:?} session {} superseded by {}", self.mode, prev.session.id, id);
            prev.token.cancel();
            self.record_ended(prev.session);
        }

        SessionTicket { id, token }
    }

    /// Cancel and remove the active session. Idempotent.
    pub fn cancel_current(&self) -> Option<SpeechSession> {
        self.cancel_if(|_| true)
    }

    /// Cancel the active session only if `check` accepts it.
    ///
    /// `check` runs under the slot lock and before the token is cancelled, so
    /// the session it sees is the one that gets cancelled.
    pub fn cancel_if(&self, check: impl FnOnce(&SpeechSession) -> bool) -> Option<SpeechSession> {
        let previous = {
            let mut active = self.lock_active();
            if !check(&active.as_ref()?.session) {
                return None;
            }
            active.take()?
        };
        previous.token.cancel();
        let ended = self.record_ended(previous.session);
        Some(ended)
    }

    /// Remove the session if it is still the active one.
    ///
    /// Returns `false` when the session was already cancelled or superseded.
    pub fn finish(&self, id: u64) -> bool {
        let mut active = self.lock_active();
        let is_current = active
            .as_ref()
            .map(|a| a.session.id == id)
            .unwrap_or(false);
        if !is_current {
            return false;
        }

        let done = active.take();
        drop(active);
        if let Some(done) = done {
            self.record_ended(done.session);
        }
        true
    }

    pub fn current(&self) -> Option<SpeechSession> {
        self.lock_active().as_ref().map(|a| a.session.clone())
    }

    pub fn is_active(&self) -> bool {
        self.lock_active().is_some()
    }

    pub fn is_current(&self, id: u64) -> bool {
        self.lock_active()
            .as_ref()
            .map(|a| a.session.id == id)
            .unwrap_or(false)
    }

    /// Most recently ended session, for diagnostics
    pub fn last_ended(&self) -> Option<SpeechSession> {
        self.last_ended.lock().ok().and_then(|s| s.clone())
    }

    fn record_ended(&self, mut session: SpeechSession) -> SpeechSession {
        session.ended_at = Some(Utc::now());
        if let Ok(mut last) = self.last_ended.lock() {
            *last = Some(session.clone());
        }
        session
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveSession>> {
        // A poisoned slot only means a panic elsewhere; the Option is still coherent
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears a slot entry when an operation's future completes or is dropped
///
/// If the future is dropped while its session is still active, `on_abandon`
/// runs so the engine is not left running with nobody listening.
pub(crate) struct SessionGuard<'a> {
    slot: &'a SessionSlot,
    id: u64,
    on_abandon: Option<Box<dyn FnOnce() + Send + 'a>>,
}

impl<'a> SessionGuard<'a> {
    pub(crate) fn new(
        slot: &'a SessionSlot,
        id: u64,
        on_abandon: impl FnOnce() + Send + 'a,
    ) -> Self {
        Self {
            slot,
            id,
            on_abandon: Some(Box::new(on_abandon)),
        }
    }

    /// Mark the operation as settled normally
    pub(crate) fn complete(mut self) {
        self.on_abandon = None;
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.slot.finish(self.id) {
            if let Some(abandon) = self.on_abandon.take() {
                abandon();
            }
        }
    }
}
