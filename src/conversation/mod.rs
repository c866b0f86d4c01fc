//! What the interviewer says back
//!
//! Help classification, prompt construction, the language-model round trip
//! and the speech-safety pass applied to every generated line.

pub mod classifier;
pub mod history;
pub mod prompt;
pub mod responder;
pub mod sanitize;

pub use classifier::{HelpClassifier, KeywordHelpClassifier, HELP_MARKERS};
pub use history::{ConversationHistory, ConversationTurnRecord, Speaker};
pub use prompt::{help_prompt, interviewer_prompt, InterviewContext};
pub use responder::{ResponseGenerator, HELP_FALLBACK, REPLY_FALLBACK};
pub use sanitize::sanitize_for_speech;
