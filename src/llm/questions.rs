use super::LanguageModel;
use crate::conversation::sanitize_for_speech;
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Generation attempts before giving up on a fresh question
pub const MAX_ATTEMPTS: usize = 2;

/// Produces the next interview question
#[async_trait::async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Must never return a question matching one in `exclude`
    async fn generate_question(
        &self,
        interview_type: &str,
        difficulty: &str,
        exclude: &[String],
    ) -> Result<String>;
}

/// Question generator backed by a language model
pub struct LlmQuestionGenerator {
    model: Arc<dyn LanguageModel>,
}

impl LlmQuestionGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn prompt(interview_type: &str, difficulty: &str, exclude: &[String]) -> String {
        let mut prompt = format!(
            "Generate one {difficulty} {interview_type} interview question.\n\
             Reply with the question only, as a single sentence a person would say out loud.\n\
             Do not number it, quote it, or use markdown."
        );
        if !exclude.is_empty() {
            prompt.push_str("\n\nDo not repeat any of these questions:");
            for question in exclude {
                prompt.push_str("\n- ");
                prompt.push_str(question);
            }
        }
        prompt
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate_question(
        &self,
        interview_type: &str,
        difficulty: &str,
        exclude: &[String],
    ) -> Result<String> {
        let prompt = Self::prompt(interview_type, difficulty, exclude);

        for attempt in 1..=MAX_ATTEMPTS {
            let raw = match self.model.generate(&prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Question generation attempt {} failed: {:#}", attempt, e);
                    continue;
                }
            };

            let question = clean_question(&raw);
            if question.is_empty() {
                debug!("Attempt {} produced no question", attempt);
                continue;
            }
            if is_excluded(&question, exclude) {
                debug!("Attempt {} repeated an earlier question", attempt);
                continue;
            }
            return Ok(question);
        }

        bail!("No new question after {} attempts", MAX_ATTEMPTS)
    }
}

/// Reduce a model reply to one speakable question
fn clean_question(raw: &str) -> String {
    let first = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    let spoken = sanitize_for_speech(first);
    let line = spoken
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
        .trim();
    let line = line
        .strip_prefix("Question:")
        .or_else(|| line.strip_prefix("question:"))
        .unwrap_or(line);
    line.trim()
        .trim_matches(|c| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
        .to_string()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case- and whitespace-insensitive match against already-asked questions
pub fn is_excluded(question: &str, exclude: &[String]) -> bool {
    let needle = normalize(question);
    exclude.iter().any(|q| normalize(q) == needle)
}

const TECHNICAL: &[&str] = &[
    "Can you walk me through how a hash map works and what happens when two keys collide?",
    "How would you find the first non-repeating character in a string, and what is the time complexity of your approach?",
    "What is the difference between a process and a thread, and when would you choose one over the other?",
    "How would you detect a cycle in a linked list?",
    "Can you explain how you would design a cache that evicts the least recently used item?",
    "How would you reverse the words in a sentence without using extra space for a second string?",
    "What happens, step by step, when you type a web address into a browser and press enter?",
];

const BEHAVIORAL: &[&str] = &[
    "Tell me about a time you disagreed with a teammate and how you resolved it.",
    "Describe a project you are proud of and the part you personally owned.",
    "Tell me about a time you missed a deadline. What did you learn from it?",
    "How do you prioritize when you have several urgent tasks at once?",
    "Describe a situation where you had to learn something new very quickly.",
    "Tell me about a piece of feedback that changed how you work.",
];

const SYSTEM_DESIGN: &[&str] = &[
    "How would you design a URL shortening service?",
    "How would you design the backend for a chat application with millions of users?",
    "How would you design a rate limiter for a public web service?",
    "How would you design a news feed that shows posts from people a user follows?",
    "How would you design a file storage service that keeps files in sync across devices?",
];

const GENERAL: &[&str] = &[
    "Can you tell me a little about yourself and your background?",
    "Why are you interested in this role?",
    "What is a technical challenge you recently worked through?",
    "Where would you like to grow over the next couple of years?",
    "What questions do you have about the team or the role?",
];

fn bank_for(interview_type: &str) -> &'static [&'static str] {
    match interview_type.to_lowercase().replace(['-', '_'], " ").as_str() {
        "technical" | "coding" => TECHNICAL,
        "behavioral" | "behavioural" => BEHAVIORAL,
        "system design" => SYSTEM_DESIGN,
        _ => GENERAL,
    }
}

/// First built-in question for `interview_type` that has not been asked yet
///
/// Once the bank is exhausted the question asked longest ago is repeated,
/// with a warning, rather than returning nothing.
pub fn fallback_question(interview_type: &str, exclude: &[String]) -> String {
    let bank = bank_for(interview_type);
    if let Some(question) = bank.iter().find(|q| !is_excluded(q, exclude)) {
        return question.to_string();
    }

    let repeat = exclude
        .iter()
        .find_map(|asked| bank.iter().find(|q| normalize(q) == normalize(asked)))
        .unwrap_or(&bank[0]);
    warn!(
        "All {} fallback questions for {:?} were asked, repeating {:?}",
        bank.len(),
        interview_type,
        repeat
    );
    repeat.to_string()
}
