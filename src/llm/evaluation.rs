use super::LanguageModel;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

/// The practice problem a submission is judged against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSpec {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEvaluation {
    pub passed: bool,
    pub score: u8,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub time_complexity: String,
    #[serde(default)]
    pub space_complexity: String,
}

impl CodeEvaluation {
    fn unavailable(reason: &str) -> Self {
        Self {
            passed: false,
            score: 0,
            feedback: format!("The solution could not be evaluated: {reason}"),
            suggestions: vec!["Try submitting again in a moment.".to_string()],
            time_complexity: "Unknown".to_string(),
            space_complexity: "Unknown".to_string(),
        }
    }
}

/// Reviews a code submission against a problem and its test cases
#[async_trait::async_trait]
pub trait CodeEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        code: &str,
        problem: &ProblemSpec,
        test_cases: &[TestCase],
    ) -> Result<CodeEvaluation>;
}

pub struct LlmCodeEvaluator {
    model: Arc<dyn LanguageModel>,
}

impl LlmCodeEvaluator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn prompt(code: &str, problem: &ProblemSpec, test_cases: &[TestCase]) -> Result<String> {
        let cases = serde_json::to_string_pretty(test_cases).context("Failed to encode test cases")?;
        Ok(format!(
            "You are reviewing a solution to a {difficulty} coding problem.\n\n\
             Problem: {title}\n{description}\n\n\
             Test cases:\n{cases}\n\n\
             Submitted code:\n```\n{code}\n```\n\n\
             Reply with JSON only, using exactly these fields:\n\
             {{\"passed\": bool, \"score\": 0-100, \"feedback\": string, \
             \"suggestions\": [string], \"timeComplexity\": string, \"spaceComplexity\": string}}",
            difficulty = problem.difficulty,
            title = problem.title,
            description = problem.description,
        ))
    }
}

#[async_trait::async_trait]
impl CodeEvaluator for LlmCodeEvaluator {
    async fn evaluate(
        &self,
        code: &str,
        problem: &ProblemSpec,
        test_cases: &[TestCase],
    ) -> Result<CodeEvaluation> {
        let prompt = Self::prompt(code, problem, test_cases)?;
        let raw = self
            .model
            .generate(&prompt)
            .await
            .context("Code evaluation request failed")?;

        Ok(parse_evaluation(&raw).unwrap_or_else(|| {
            warn!("Unparsable code evaluation from language model");
            CodeEvaluation::unavailable("the reviewer returned an unexpected format")
        }))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    passed: bool,
    score: f64,
    feedback: String,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    time_complexity: String,
    #[serde(default)]
    space_complexity: String,
}

/// Pull the evaluation object out of a model reply, fenced or bare
fn parse_evaluation(raw: &str) -> Option<CodeEvaluation> {
    let body = match FENCED_JSON.captures(raw) {
        Some(caps) => caps.get(1)?.as_str().to_string(),
        None => {
            let start = raw.find('{')?;
            let end = raw.rfind('}')?;
            if end < start {
                return None;
            }
            raw[start..=end].to_string()
        }
    };

    let parsed: RawEvaluation = serde_json::from_str(&body).ok()?;
    Some(CodeEvaluation {
        passed: parsed.passed,
        score: parsed.score.clamp(0.0, 100.0).round() as u8,
        feedback: parsed.feedback,
        suggestions: parsed.suggestions,
        time_complexity: parsed.time_complexity,
        space_complexity: parsed.space_complexity,
    })
}
