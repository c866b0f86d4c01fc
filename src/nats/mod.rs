pub mod client;
pub mod engines;
pub mod factory;
pub mod messages;

pub use client::NatsClient;
pub use engines::{NatsRecognitionEngine, NatsSynthesisEngine};
pub use factory::NatsSessionFactory;
pub use messages::{
    ListenControl, RecognitionErrorMessage, SpeakRequest, SpeechEventKind, SpeechEventMessage,
    TranscriptMessage,
};
