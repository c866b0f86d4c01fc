use super::engine::RecognitionResult;

/// Recognized speech accumulated during one listening session
///
/// `text` only ever grows while the session is open; `interim_text` is
/// replaced wholesale by each recognition event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub interim_text: String,
    pub is_final: bool,
}

/// What one recognition event contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultDelta {
    pub final_text: String,
    pub interim_text: String,
}

impl ResultDelta {
    pub fn has_final(&self) -> bool {
        !self.final_text.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.final_text.is_empty() && self.interim_text.is_empty()
    }
}

impl Utterance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a recognition event into the utterance.
    ///
    /// Only slots from `result_index` onward are new; committed slots are
    /// appended to `text`, tentative ones replace `interim_text`.
    pub fn apply(&mut self, result_index: usize, results: &[RecognitionResult]) -> ResultDelta {
        let mut delta = ResultDelta::default();

        for result in results.iter().skip(result_index) {
            if result.is_final {
                delta.final_text.push_str(&result.transcript);
            } else {
                delta.interim_text.push_str(&result.transcript);
            }
        }

        self.text.push_str(&delta.final_text);
        self.interim_text = delta.interim_text.clone();
        self.is_final = delta.interim_text.is_empty() && !self.text.is_empty();

        delta
    }

    /// Committed text followed by the current guess, for live display
    pub fn live_text(&self) -> String {
        format!("{}{}", self.text, self.interim_text)
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Close the utterance, dropping anything still tentative
    pub fn finalize(mut self) -> String {
        self.interim_text.clear();
        self.is_final = true;
        self.text.trim().to_string()
    }
}
