//! Speech capture and speech output
//!
//! This module wraps the platform's streaming recognizer and synthesizer:
//! - `SpeechOutput`: one utterance at a time, interruption, safety timeout
//! - `SpeechCapture`: listen until trailing silence, partial transcripts
//! - `SilenceDetector`: end-of-turn decision
//! - `SessionSlot`: at most one active session per mode, with a
//!   cancellation token guarding every engine callback

pub mod capture;
pub mod engine;
pub mod output;
pub mod session;
pub mod silence;
pub mod transcript;

pub use capture::{CaptureConfig, ListenMode, PartialCallback, SpeechCapture};
pub use engine::{
    MicrophonePermission, PermissionState, RecognitionEngine, RecognitionErrorKind,
    RecognitionEvent, RecognitionResult, SpokenUtterance, StaticPermission, SynthesisEngine,
    SynthesisErrorKind, SynthesisEvent,
};
pub use output::{InterruptCallback, OutputConfig, SpeakOutcome, SpeechOutput};
pub use session::{SessionMode, SessionSlot, SessionTicket, SpeechSession};
pub use silence::SilenceDetector;
pub use transcript::Utterance;
