//! Clean model output so it reads naturally through text-to-speech.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]*)\]\([^()]*\)").unwrap());
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`{1,3}([^`]*)`{1,3}").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static STRAY_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_~`]").unwrap());
static LINE_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:#+[ \t]*|[-+>][ \t]+)+").unwrap());
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?:;,])?[ \t]*\n[ \t]*\n\s*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static FOR_EXAMPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\be\.g\.").unwrap());
static THAT_IS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bi\.e\.").unwrap());
static AND_SO_ON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\betc\.(\s+[A-Z])?").unwrap());
static VERSUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvs\.").unwrap());

static ACRONYM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(API|URL|HTTP|JSON|SQL|HTML|CSS|CPU)\b").unwrap());

static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());
static SENTENCE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s*([A-Z])").unwrap());
static COLON_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*([^\s\d/.,;:!?)])").unwrap());
static SEMICOLON_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*([^\s.,;:!?)])").unwrap());

/// Make `text` safe for spoken playback.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_for_speech(text: &str) -> String {
    let mut out = strip_markup(text.trim());
    out = collapse_whitespace(out.trim());
    // "e .g." must read as "e.g." before abbreviations are expanded
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out = expand_abbreviations(&out);
    out = spell_acronyms(&out);
    out = normalize_punctuation(&out);
    out.trim().to_string()
}

/// Repeat until nothing changes: removing one marker can expose another,
/// such as a link whose target sat inside a code span.
fn strip_markup(text: &str) -> String {
    let mut out = text.to_string();
    loop {
        let next = strip_markup_once(&out);
        // Every removal shortens the text, so this terminates
        if next == out {
            return out;
        }
        out = next;
    }
}

fn strip_markup_once(text: &str) -> String {
    let out = LINK.replace_all(text, "$1");
    let out = CODE_SPAN.replace_all(&out, "$1");
    let out = BOLD.replace_all(&out, "$1");
    let out = ITALIC.replace_all(&out, "$1");
    let out = STRAY_MARKUP.replace_all(&out, "");
    LINE_MARKERS.replace_all(&out, "").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    let out = PARAGRAPH_BREAK.replace_all(text, |caps: &Captures| match caps.get(1) {
        Some(punct) => format!("{} ", punct.as_str()),
        None => ". ".to_string(),
    });
    WHITESPACE.replace_all(&out, " ").into_owned()
}

fn expand_abbreviations(text: &str) -> String {
    let out = FOR_EXAMPLE.replace_all(text, "for example");
    let out = THAT_IS.replace_all(&out, "that is");
    let out = AND_SO_ON.replace_all(&out, |caps: &Captures| match caps.get(1) {
        // "etc." closing a sentence keeps its full stop
        Some(next) => format!("and so on.{}", next.as_str()),
        None => "and so on".to_string(),
    });
    VERSUS.replace_all(&out, "versus").into_owned()
}

fn spell_acronyms(text: &str) -> String {
    ACRONYM
        .replace_all(text, |caps: &Captures| {
            let letters: Vec<String> = caps[1].chars().map(String::from).collect();
            letters.join(" ")
        })
        .into_owned()
}

fn normalize_punctuation(text: &str) -> String {
    let out = SPACE_BEFORE_PUNCT.replace_all(text, "$1");
    let out = SENTENCE_GAP.replace_all(&out, "$1 $2");
    let out = COLON_GAP.replace_all(&out, ": $1");
    let out = SEMICOLON_GAP.replace_all(&out, "; $1");
    WHITESPACE.replace_all(&out, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_idempotent(input: &str) {
        let once = sanitize_for_speech(input);
        let twice = sanitize_for_speech(&once);
        assert_eq!(once, twice, "not idempotent for {:?}", input);
    }

    #[test]
    fn test_strips_emphasis_and_keeps_word_order() {
        let out = sanitize_for_speech("That is **really** a *great* and __solid__ idea");
        assert_eq!(out, "That is really a great and solid idea");
    }

    #[test]
    fn test_strips_headings_code_and_links() {
        let out = sanitize_for_speech(
            "## Feedback\nUse a `HashMap` here, see [the docs](https://example.com/docs).",
        );
        assert_eq!(out, "Feedback Use a HashMap here, see the docs.");
    }

    #[test]
    fn test_paragraph_breaks_become_sentences() {
        let out = sanitize_for_speech("Good start\n\nNow think about edge cases.\n\n\nWhat else?");
        assert_eq!(out, "Good start. Now think about edge cases. What else?");
    }

    #[test]
    fn test_expands_abbreviations() {
        let out = sanitize_for_speech("Use a stack, e.g. for parsing, i.e. brackets, trees etc.");
        assert_eq!(
            out,
            "Use a stack, for example for parsing, that is brackets, trees and so on"
        );
        assert_eq!(
            sanitize_for_speech("Arrays vs. lists etc. Then we move on."),
            "Arrays versus lists and so on. Then we move on."
        );
    }

    #[test]
    fn test_spells_acronyms_whole_word_only() {
        let out = sanitize_for_speech("Call the API over HTTP and return JSON from SQL.");
        assert_eq!(out, "Call the A P I over H T T P and return J S O N from S Q L.");

        // Partial words and other casings are left alone
        assert_eq!(sanitize_for_speech("RAPID apis Api"), "RAPID apis Api");
    }

    #[test]
    fn test_normalizes_punctuation_spacing() {
        assert_eq!(
            sanitize_for_speech("Nice.Next question:what is a heap ;think about it"),
            "Nice. Next question: what is a heap; think about it"
        );
        // Times are not split
        assert_eq!(sanitize_for_speech("Meet at 10:30"), "Meet at 10:30");
    }

    #[test]
    fn test_no_markup_characters_remain() {
        let out = sanitize_for_speech("# Title\n- **bold** _it_ ~strike~ `code` ***both***");
        for ch in ['*', '_', '~', '`', '#'] {
            assert!(!out.contains(ch), "{:?} left in {:?}", ch, out);
        }
        assert_eq!(out, "Title bold it strike code both");
    }

    #[test]
    fn test_link_exposed_by_code_span_is_stripped() {
        assert_eq!(
            sanitize_for_speech("See [docs]`(https://x.io)` now"),
            "See docs now"
        );
        assert_eq!(sanitize_for_speech("e .g. a queue"), "for example a queue");
    }

    #[test]
    fn test_idempotent_on_tricky_inputs() {
        for input in [
            "",
            "   ",
            "plain sentence",
            "**bold** and *italic*\n\n## Heading\n- item one\n- item two",
            "[[nested](inner)](outer) link",
            "*# not a heading",
            "## # double heading",
            "e.g. i.e. etc. vs. API URL",
            "Wait .What ?Really !Yes",
            "Ends with a break\n\n",
            "\n\nStarts with a break",
            "a : b ; c",
            "U.S. based company. Great",
            "Hello.\n\nWorld",
            "See [docs]`(https://x.io)` now",
            "[a]**(b)** and [[c]`(d)`](e)",
            "e .g. and vs . and etc .",
        ] {
            assert_idempotent(input);
        }
    }
}
