use thiserror::Error;

/// Failures raised by the speech capture and speech output adapters.
///
/// Only `CapabilityUnavailable` and `PermissionDenied` block the interview;
/// everything else degrades into an empty turn or a transient notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("speech capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no speech detected")]
    NoSpeech,

    #[error("network error during speech recognition")]
    Network,

    #[error("speech recognition service not allowed")]
    ServiceUnavailable,

    #[error("speech recognition grammar error")]
    BadGrammar,

    #[error("already listening")]
    AlreadyListening,

    #[error("failed to start speech recognition: {0}")]
    StartFailed(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("speech recognition error: {0}")]
    Engine(String),
}

impl SpeechError {
    /// Message shown to the candidate.
    pub fn user_message(&self) -> String {
        match self {
            SpeechError::CapabilityUnavailable(_) => {
                "Speech recognition is not supported on this client. Please use a client with voice support, such as Chrome, Edge, or Safari.".to_string()
            }
            SpeechError::PermissionDenied => {
                "Microphone access denied. Please allow microphone access for this site, then try again.".to_string()
            }
            SpeechError::NoSpeech => {
                "No speech detected. Please speak clearly and try again.".to_string()
            }
            SpeechError::Network => {
                "Network error. Please check your internet connection and try again.".to_string()
            }
            SpeechError::ServiceUnavailable => {
                "Speech recognition service not allowed. Please check your browser settings.".to_string()
            }
            SpeechError::BadGrammar => {
                "Speech recognition grammar error. Please try speaking again.".to_string()
            }
            SpeechError::AlreadyListening => "Already listening".to_string(),
            SpeechError::StartFailed(_) => {
                "Failed to start speech recognition. Please ensure your microphone is connected and try again.".to_string()
            }
            SpeechError::Synthesis(_) | SpeechError::Engine(_) => {
                "Speech recognition error occurred".to_string()
            }
        }
    }

    /// Errors that stop the voice flow until the user acts.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            SpeechError::CapabilityUnavailable(_) | SpeechError::PermissionDenied
        )
    }

    /// Errors that amount to "the candidate said nothing".
    pub fn is_empty_turn(&self) -> bool {
        matches!(self, SpeechError::NoSpeech)
    }
}
