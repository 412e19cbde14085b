//! Best-effort scrubbing of prompt-injection phrasing from knowledge text.
//!
//! This is defense in depth, not a security boundary: it only catches a
//! handful of well-known phrasings. The knowledge block is additionally
//! fenced and labelled as untrusted in the instruction.

use std::sync::OnceLock;

use regex::Regex;

/// Text substituted for each match.
pub const REDACTION_MARKER: &str = "[redacted]";

const INJECTION_PATTERNS: [&str; 5] = [
    r"(?i)ignore\s+(all|previous)\s+instructions",
    r"(?i)system\s+prompt",
    r"(?i)you\s+are\s+chatgpt",
    r"(?i)jailbreak",
    r"(?i)do\s+anything\s+now",
];

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INJECTION_PATTERNS
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    tracing::error!("Invalid injection pattern {}: {}", pattern, err);
                    None
                }
            })
            .collect()
    })
}

/// Strip NUL bytes, redact every known injection phrase and trim.
///
/// Idempotent: the marker matches none of the patterns.
pub fn sanitize_knowledge(text: &str) -> String {
    let mut sanitized = text.replace('\0', "");
    for pattern in patterns() {
        if pattern.is_match(&sanitized) {
            sanitized = pattern.replace_all(&sanitized, REDACTION_MARKER).into_owned();
        }
    }
    sanitized.trim().to_string()
}
