pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod interview;
pub mod llm;
pub mod nats;
pub mod speech;
pub mod store;

pub use config::Config;
pub use conversation::{
    sanitize_for_speech, HelpClassifier, InterviewContext, KeywordHelpClassifier,
    ResponseGenerator,
};
pub use error::SpeechError;
pub use http::{create_router, AppState};
pub use interview::{
    Collaborators, CompletionScore, InterviewConfig, InterviewSession, InterviewSettings,
    InterviewSnapshot, InterviewStatus, ScoringPolicy, SessionFactory, SharedServices, TurnPhase,
};
pub use llm::{
    CodeEvaluation, CodeEvaluator, GeminiClient, LanguageModel, LlmCodeEvaluator,
    LlmQuestionGenerator, QuestionGenerator,
};
pub use nats::{NatsClient, NatsSessionFactory, TranscriptMessage};
pub use speech::{
    ListenMode, MicrophonePermission, PermissionState, RecognitionEngine, SilenceDetector,
    SpeakOutcome, SpeechCapture, SpeechOutput, SynthesisEngine,
};
pub use store::{InterviewStore, MemoryStore, SupabaseStore};
