use serde::{Deserialize, Serialize};

/// Subject names shared with the remote voice client
pub mod subjects {
    /// All transcripts, partial and final. Filtered by `session_id` in the payload.
    pub const TRANSCRIPTS: &str = "stt.text.>";

    pub fn listen_start(session_id: &str) -> String {
        format!("voice.listen.start.{}", session_id)
    }

    pub fn listen_stop(session_id: &str) -> String {
        format!("voice.listen.stop.{}", session_id)
    }

    pub fn listen_error(session_id: &str) -> String {
        format!("voice.listen.error.{}", session_id)
    }

    pub fn speak(session_id: &str) -> String {
        format!("tts.speak.{}", session_id)
    }

    pub fn speech_events(session_id: &str) -> String {
        format!("tts.event.{}", session_id)
    }

    pub fn cancel_speech(session_id: &str) -> String {
        format!("tts.cancel.{}", session_id)
    }
}

/// Transcript message received from STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Asks the voice client to open or close its microphone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenControl {
    pub session_id: String,
    pub language: String,
    pub interim_results: bool,
    pub timestamp: String, // RFC3339 timestamp
}

/// Recognizer failure reported by the voice client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionErrorMessage {
    pub session_id: String,
    /// Recognizer error code ("not-allowed", "no-speech", "network", ...)
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Utterance for the voice client to play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub session_id: String,
    pub utterance_id: String,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechEventKind {
    Start,
    End,
    Error,
}

/// Playback lifecycle event from the voice client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechEventMessage {
    pub session_id: String,
    pub utterance_id: String,
    pub event: SpeechEventKind,
    /// Error code when `event` is `error` ("interrupted", "canceled", ...)
    #[serde(default)]
    pub error: Option<String>,
}

/// Stop whatever the voice client is playing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSpeech {
    pub session_id: String,
    pub timestamp: String,
}
