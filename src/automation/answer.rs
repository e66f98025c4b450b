//! Answer normalization.
//!
//! The oracle returns free text such as "A", "A, C" or "对". `normalize`
//! turns it into option tokens; `resolve` maps one token onto the option
//! coordinates known for the current capture.

use std::collections::BTreeMap;

use crate::automation::geometry::Point;

/// Label clicked for an affirmative answer.
pub const AFFIRMATIVE_LABEL: &str = "对";
/// Label clicked for a negative answer.
pub const NEGATIVE_LABEL: &str = "错";

const AFFIRMATIVE_WORDS: [&str; 3] = ["对", "正确", "TRUE"];
const NEGATIVE_WORDS: [&str; 3] = ["错", "错误", "FALSE"];

/// Splits a raw answer into option tokens.
///
/// - blank input gives no tokens
/// - comma-separated input is a multi-select: pieces are trimmed, empty pieces dropped
/// - anything else is a single trimmed token
pub fn normalize(raw: &str) -> Vec<String> {
    let answer = raw.trim();
    if answer.is_empty() {
        return Vec::new();
    }

    if answer.contains(',') {
        answer
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        vec![answer.to_string()]
    }
}

/// Finds the option a token refers to.
///
/// Tries the exact label, then a case-insensitive label, then the boolean
/// vocabulary. Returns the matched label and its point.
pub fn resolve<'a>(
    token: &str,
    positions: &'a BTreeMap<String, Point>,
) -> Option<(&'a str, Point)> {
    if let Some((label, point)) = positions.get_key_value(token) {
        return Some((label.as_str(), *point));
    }

    if let Some((label, point)) = positions
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(token))
    {
        return Some((label.as_str(), *point));
    }

    let boolean_label = boolean_label(token)?;
    positions
        .get_key_value(boolean_label)
        .map(|(label, point)| (label.as_str(), *point))
}

/// Maps yes/no style answers onto the option label used on screen.
fn boolean_label(token: &str) -> Option<&'static str> {
    if AFFIRMATIVE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(token)) {
        Some(AFFIRMATIVE_LABEL)
    } else if NEGATIVE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(token)) {
        Some(NEGATIVE_LABEL)
    } else {
        None
    }
}
