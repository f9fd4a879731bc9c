//! Prompt construction and response post-processing for the remote tier

use regex::Regex;
use std::sync::LazyLock;

/// Leading bullets and numbering: `-`, `*`, `•`, `1.`, `2)`, `Q3:`
static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]+|\d+[.)]|Q\d+[:.)])\s*").expect("list marker pattern is valid")
});

pub fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following lesson content in 2-3 clear sentences. \
         Reply with the summary only.\n\n{}",
        text.trim()
    )
}

pub fn questions_prompt(text: &str, count: usize) -> String {
    let range = if count > 0 && count < 5 {
        count.to_string()
    } else {
        "5-7".to_string()
    };
    format!(
        "Write {} study questions about the following lesson content. \
         Put one question per line with no numbering or extra text.\n\n{}",
        range,
        text.trim()
    )
}

/// Clean a model reply into a trimmed summary
pub fn parse_summary(reply: &str) -> String {
    reply.trim().to_string()
}

/// Extract question lines from a model reply
///
/// Lines are trimmed and stripped of bullets or numbering. Only lines that end
/// in `?` or start with `Explain` or `Describe` are kept.
pub fn parse_questions(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| LIST_MARKER_RE.replace(line, "").trim().to_string())
        .filter(|line| looks_like_question(line))
        .collect()
}

fn looks_like_question(line: &str) -> bool {
    !line.is_empty()
        && (line.ends_with('?') || line.starts_with("Explain") || line.starts_with("Describe"))
}
