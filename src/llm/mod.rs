//! Remote text generation
//!
//! - `LanguageModel`: generic prompt-in, text-out completion
//! - `GeminiClient`: Google Generative Language REST implementation
//! - `QuestionGenerator`: interview questions that avoid repeats
//! - `CodeEvaluator`: structured review of practice-problem submissions

mod evaluation;
mod gemini;
mod questions;

pub use evaluation::{CodeEvaluation, CodeEvaluator, LlmCodeEvaluator, ProblemSpec, TestCase};
pub use gemini::{GeminiClient, GeminiConfig};
pub use questions::{
    fallback_question, is_excluded, LlmQuestionGenerator, QuestionGenerator, MAX_ATTEMPTS,
};

use anyhow::Result;

/// A text-completion service
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
