//! Input Guard
//!
//! Screens every user answer for phrases commonly used to talk the assistant
//! out of its persona. Matching is a plain case-insensitive substring check;
//! it is trivially bypassable (e.g. "a c t as") and makes no attempt at
//! semantic detection.

/// Phrases that cause an answer to be rejected.
pub const BLOCKED_PHRASES: [&str; 6] = [
    "ignore previous",
    "pretend you're",
    "act as",
    "reveal",
    "override",
    "bypass",
];

/// Message shown to the user when an answer is rejected.
pub const REJECTION_NOTICE: &str = "⚠️ Your input contains restricted phrases. Please rephrase.";

/// Returns the first blocked phrase contained in `input`, if any.
pub fn find_blocked_phrase(input: &str) -> Option<&'static str> {
    let lowered = input.to_lowercase();
    BLOCKED_PHRASES
        .iter()
        .copied()
        .find(|phrase| lowered.contains(phrase))
}

/// Whether `input` may be passed on to the session.
pub fn is_allowed(input: &str) -> bool {
    find_blocked_phrase(input).is_none()
}
