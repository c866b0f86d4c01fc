use super::classifier::HelpClassifier;
use super::prompt::{help_prompt, interviewer_prompt, InterviewContext};
use super::sanitize::sanitize_for_speech;
use crate::llm::LanguageModel;
use std::sync::Arc;
use tracing::{debug, warn};

/// Spoken when the model fails on an ordinary answer
pub const REPLY_FALLBACK: &str =
    "That's interesting! Can you tell me a bit more about that approach?";

/// Spoken when the model fails on a help request
pub const HELP_FALLBACK: &str =
    "Of course! Let me help you think through this. What part would you like me to clarify?";

/// Turns a candidate utterance into the interviewer's next spoken line
///
/// Never fails: model errors and empty model output fall back to a fixed
/// in-character line, and every result is sanitized for speech.
pub struct ResponseGenerator {
    model: Arc<dyn LanguageModel>,
    classifier: Arc<dyn HelpClassifier>,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, classifier: Arc<dyn HelpClassifier>) -> Self {
        Self { model, classifier }
    }

    pub fn is_help_request(&self, utterance: &str) -> bool {
        self.classifier.is_help_request(utterance)
    }

    /// Reply to an answer, switching to the hint path for help requests
    pub async fn respond(&self, utterance: &str, context: &InterviewContext) -> String {
        if self.is_help_request(utterance) {
            debug!("Utterance classified as help request");
            return self.help(utterance, context).await;
        }

        let prompt = interviewer_prompt(utterance, context);
        self.complete(&prompt, REPLY_FALLBACK).await
    }

    /// Supportive hint for the current question
    pub async fn help(&self, request: &str, context: &InterviewContext) -> String {
        let prompt = help_prompt(request, context);
        self.complete(&prompt, HELP_FALLBACK).await
    }

    async fn complete(&self, prompt: &str, fallback: &str) -> String {
        match self.model.generate(prompt).await {
            Ok(text) => {
                let spoken = sanitize_for_speech(&text);
                if spoken.is_empty() {
                    warn!("Language model returned no usable text, using fallback");
                    fallback.to_string()
                } else {
                    spoken
                }
            }
            Err(e) => {
                warn!("Language model request failed: {:#}", e);
                fallback.to_string()
            }
        }
    }
}
