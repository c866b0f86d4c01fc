use rand::Rng;

/// Final score for an interview, 0 to 100
pub trait ScoringPolicy: Send + Sync {
    fn score(&self, questions_asked: usize, max_questions: usize) -> u8;
}

/// Completion ratio plus a small random bonus, capped at 100
///
/// A coarse proxy, not an assessment of answer quality.
#[derive(Debug, Clone)]
pub struct CompletionScore {
    max_bonus: f64,
}

impl CompletionScore {
    pub fn new() -> Self {
        Self { max_bonus: 20.0 }
    }

    pub fn with_max_bonus(max_bonus: f64) -> Self {
        Self {
            max_bonus: max_bonus.max(0.0),
        }
    }
}

impl Default for CompletionScore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringPolicy for CompletionScore {
    fn score(&self, questions_asked: usize, max_questions: usize) -> u8 {
        if max_questions == 0 {
            return 0;
        }
        let completion = (questions_asked.min(max_questions) as f64 / max_questions as f64) * 100.0;
        let bonus = if self.max_bonus > 0.0 {
            rand::thread_rng().gen_range(0.0..self.max_bonus)
        } else {
            0.0
        };
        (completion + bonus).min(100.0).round() as u8
    }
}
