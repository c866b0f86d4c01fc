/// Decides whether something the candidate said is a request for help
pub trait HelpClassifier: Send + Sync {
    fn is_help_request(&self, utterance: &str) -> bool;
}

/// Marker phrases that signal a help request
pub const HELP_MARKERS: &[&str] = &[
    "help",
    "hint",
    "explain",
    "clarify",
    "confused",
    "what do you mean",
    "stuck",
    "don't know",
    "not sure",
    "can you give me",
    "guide me",
];

/// Case-insensitive substring match against a fixed phrase list
#[derive(Debug, Clone)]
pub struct KeywordHelpClassifier {
    markers: Vec<String>,
}

impl KeywordHelpClassifier {
    pub fn new() -> Self {
        Self::with_markers(HELP_MARKERS.iter().copied())
    }

    pub fn with_markers<'a>(markers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            markers: markers.into_iter().map(str::to_lowercase).collect(),
        }
    }
}

impl Default for KeywordHelpClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpClassifier for KeywordHelpClassifier {
    fn is_help_request(&self, utterance: &str) -> bool {
        // Recognizers often emit typographic apostrophes ("don’t")
        let normalized = utterance.to_lowercase().replace('\u{2019}', "'");
        self.markers.iter().any(|m| normalized.contains(m.as_str()))
    }
}
