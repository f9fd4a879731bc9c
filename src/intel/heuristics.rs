//! Local heuristics that back every remote operation
//!
//! Everything here is pure and deterministic: the same input always yields the
//! same output, with no I/O.

use regex::Regex;
use std::sync::LazyLock;

/// Default cap on local summary length, in characters
pub const DEFAULT_MAX_SUMMARY_CHARS: usize = 1000;

/// Prompt used to pad question lists to the requested count
pub const GENERIC_QUESTION: &str = "Describe the main idea of the text.";

/// Longest sentence excerpt used in an `Explain:` prompt, in characters
const EXPLAIN_EXCERPT_CHARS: usize = 80;

const PRONOUNS: &[&str] = &["It", "This", "That", "There", "He", "She", "They", "These", "Those"];
const ARTICLES: &[&str] = &["The", "A", "An"];

/// A capitalized phrase of up to five words directly before "is"
static SUBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][\w'-]*(?:\s+[\w'-]+){0,4}?)\s+is\b").expect("subject pattern is valid")
});

/// Collapse every whitespace run to a single space and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences
///
/// A sentence ends after a run of `.`, `!` or `?` that is followed by
/// whitespace or the end of the text, so decimals like `3.14` stay intact.
/// Text without a terminator is a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = collapse_whitespace(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !matches!(next, '.' | '!' | '?') {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if at_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Truncate to at most `max_chars` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// First `max_sentences` sentences of `text`, capped at [`DEFAULT_MAX_SUMMARY_CHARS`]
///
/// ```
/// use lesson_intel::intel::heuristics::local_summary_fallback;
///
/// assert_eq!(local_summary_fallback("A. B. C. D.", 2), "A. B.");
/// ```
pub fn local_summary_fallback(text: &str, max_sentences: usize) -> String {
    local_summary_fallback_capped(text, max_sentences, DEFAULT_MAX_SUMMARY_CHARS)
}

/// First `max_sentences` sentences of `text`, capped at `max_chars` characters
pub fn local_summary_fallback_capped(text: &str, max_sentences: usize, max_chars: usize) -> String {
    let summary = split_sentences(text)
        .into_iter()
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&summary, max_chars).trim_end().to_string()
}

/// Exactly `count` study questions derived from `text`, or none for blank text
///
/// Each of the first `count` sentences becomes a "What is X?" question when it
/// opens with a noun phrase followed by "is", and an "Explain:" prompt
/// otherwise. The list is padded with [`GENERIC_QUESTION`].
pub fn local_questions_fallback(text: &str, count: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut questions: Vec<String> = split_sentences(text)
        .iter()
        .take(count)
        .map(|sentence| question_for_sentence(sentence))
        .collect();

    pad_questions(&mut questions, count);
    questions
}

/// Fill `questions` up to `count` with the generic prompt
pub fn pad_questions(questions: &mut Vec<String>, count: usize) {
    while questions.len() < count {
        questions.push(GENERIC_QUESTION.to_string());
    }
}

fn question_for_sentence(sentence: &str) -> String {
    match extract_subject(sentence) {
        Some(subject) => format!("What is {}?", subject),
        None => {
            let excerpt = truncate_chars(sentence, EXPLAIN_EXCERPT_CHARS);
            if excerpt.len() < sentence.len() {
                format!("Explain: {}...", excerpt.trim_end())
            } else {
                format!("Explain: {}", sentence)
            }
        }
    }
}

/// The capitalized noun phrase preceding "is", if the sentence opens with one
pub fn extract_subject(sentence: &str) -> Option<String> {
    let captures = SUBJECT_RE.captures(sentence.trim())?;
    let phrase = captures.get(1)?.as_str();

    let mut words = phrase.split_whitespace();
    let first = words.next()?;
    if PRONOUNS.contains(&first) {
        return None;
    }

    if ARTICLES.contains(&first) {
        let rest = words.collect::<Vec<_>>();
        if rest.is_empty() {
            return None;
        }
        return Some(format!("{} {}", first.to_lowercase(), rest.join(" ")));
    }

    Some(phrase.to_string())
}
