use crate::error::SpeechError;
use tokio::sync::mpsc;

/// One alternative reported by the recognizer for a single result slot
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Best transcript for this slot
    pub transcript: String,
    /// Whether the engine committed this slot (it will not change again)
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn committed(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Error codes a streaming recognizer can report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NotAllowed,
    NoSpeech,
    Network,
    ServiceNotAllowed,
    BadGrammar,
    Aborted,
    Other(String),
}

impl RecognitionErrorKind {
    /// Map a recognizer error code ("not-allowed", "no-speech", ...) to a kind
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" => RecognitionErrorKind::NotAllowed,
            "no-speech" => RecognitionErrorKind::NoSpeech,
            "network" => RecognitionErrorKind::Network,
            "service-not-allowed" => RecognitionErrorKind::ServiceNotAllowed,
            "bad-grammar" => RecognitionErrorKind::BadGrammar,
            "aborted" => RecognitionErrorKind::Aborted,
            other => RecognitionErrorKind::Other(other.to_string()),
        }
    }
}

impl From<RecognitionErrorKind> for SpeechError {
    fn from(kind: RecognitionErrorKind) -> Self {
        match kind {
            RecognitionErrorKind::NotAllowed => SpeechError::PermissionDenied,
            RecognitionErrorKind::NoSpeech => SpeechError::NoSpeech,
            RecognitionErrorKind::Network => SpeechError::Network,
            RecognitionErrorKind::ServiceNotAllowed => SpeechError::ServiceUnavailable,
            RecognitionErrorKind::BadGrammar => SpeechError::BadGrammar,
            RecognitionErrorKind::Aborted => SpeechError::Engine("aborted".to_string()),
            RecognitionErrorKind::Other(code) => SpeechError::Engine(code),
        }
    }
}

/// Events emitted by a streaming recognizer while it is running
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Result list update. Slots before `result_index` are unchanged since the
    /// previous event and must not be re-read.
    Results {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    /// The engine failed; the stream ends after this event
    Error(RecognitionErrorKind),
    /// The engine stopped on its own (or after `stop`)
    End,
}

/// Terminal and lifecycle events for one synthesized utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Start,
    End,
    Error(SynthesisErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisErrorKind {
    /// Playback was cut off by a newer utterance or by the user
    Interrupted,
    /// Playback was cancelled before or during output
    Canceled,
    Other(String),
}

impl SynthesisErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "interrupted" => SynthesisErrorKind::Interrupted,
            "canceled" | "cancelled" => SynthesisErrorKind::Canceled,
            other => SynthesisErrorKind::Other(other.to_string()),
        }
    }
}

/// Text plus voice parameters handed to a synthesis engine
#[derive(Debug, Clone, PartialEq)]
pub struct SpokenUtterance {
    pub id: uuid::Uuid,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
}

/// Microphone permission as reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    Unknown,
}

/// Continuous speech-to-text capability
///
/// Implementations:
/// - NATS: transcripts streamed from a remote voice client
/// - Test fakes: scripted event sequences
#[async_trait::async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Whether the platform offers streaming recognition at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Start continuous recognition with interim results enabled
    ///
    /// Returns a channel receiver that will receive recognition events
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, SpeechError>;

    /// Stop recognition. Safe to call when not running.
    fn stop(&self);

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// Text-to-speech capability
#[async_trait::async_trait]
pub trait SynthesisEngine: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    /// Queue an utterance for playback
    ///
    /// Returns a channel receiver for that utterance's lifecycle events
    async fn speak(
        &self,
        utterance: SpokenUtterance,
    ) -> Result<mpsc::Receiver<SynthesisEvent>, SpeechError>;

    /// Cancel whatever is playing. Safe to call when idle.
    fn cancel(&self);

    fn name(&self) -> &str;
}

/// Query/request access to the microphone
#[async_trait::async_trait]
pub trait MicrophonePermission: Send + Sync {
    async fn query(&self) -> PermissionState;

    /// Ask the user for access. Returns whether access was granted.
    async fn request(&self) -> bool;
}

/// Permission surface with a fixed answer, for hosts where the remote client
/// has already negotiated microphone access
pub struct StaticPermission {
    state: std::sync::Mutex<PermissionState>,
}

impl StaticPermission {
    pub fn new(state: PermissionState) -> Self {
        Self {
            state: std::sync::Mutex::new(state),
        }
    }

    pub fn set(&self, state: PermissionState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }
}

#[async_trait::async_trait]
impl MicrophonePermission for StaticPermission {
    async fn query(&self) -> PermissionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(PermissionState::Unknown)
    }

    async fn request(&self) -> bool {
        self.query().await == PermissionState::Granted
    }
}
