//! Locating option and question-number markers in positional OCR output.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::automation::geometry::{Point, PositionedWord};

/// Option labels recognized on screen, in match priority order.
pub const OPTION_MARKERS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "对", "错"];

/// Characters that may follow an option label, e.g. "A." or "B、".
const OPTION_DELIMITERS: [char; 4] = ['.', '、', '）', ')'];

/// Question-number shapes, tried in order:
/// "1.", "1、", "(1)" / "（1）", "1)" / "1）", then a loose "1." prefix such as "1.Which...".
const QUESTION_PATTERNS: [&str; 5] = [
    r"^(\d+)\.$",
    r"^(\d+)、$",
    r"^[（(](\d+)[）)]$",
    r"^(\d+)[）)]$",
    r"^(\d+)[.、）)]",
];

static QUESTION_REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();

fn question_regexes() -> &'static [Regex] {
    QUESTION_REGEXES.get_or_init(|| {
        QUESTION_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// Returns the option label a word starts with, if any.
fn option_label(text: &str) -> Option<&'static str> {
    OPTION_MARKERS.iter().copied().find(|marker| {
        text == *marker
            || text
                .strip_prefix(marker)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| OPTION_DELIMITERS.contains(&c))
    })
}

/// Builds a label → screen point map from the words of one capture.
///
/// The first occurrence of a label wins. Points are box centers offset by
/// `region_origin`, the top-left corner of the captured region.
pub fn parse_option_markers(
    words: &[PositionedWord],
    region_origin: Point,
) -> BTreeMap<String, Point> {
    let mut positions = BTreeMap::new();

    for word in words {
        let Some(label) = option_label(word.text.trim()) else {
            continue;
        };
        positions
            .entry(label.to_string())
            .or_insert_with(|| word.bounds.center_from(region_origin));
    }

    positions
}

/// Parses a question id from a single word using the numbering shapes above.
fn question_id(text: &str) -> Option<u32> {
    question_regexes().iter().find_map(|regex| {
        regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    })
}

/// Builds a question id → top offset map from the words of one capture.
///
/// Offsets are relative to the capture. An id seen twice keeps its first offset.
pub fn parse_question_markers(words: &[PositionedWord]) -> BTreeMap<u32, i32> {
    let mut questions = BTreeMap::new();

    for word in words {
        let Some(id) = question_id(word.text.trim()) else {
            continue;
        };
        if id == 0 {
            continue;
        }
        questions.entry(id).or_insert(word.bounds.top);
    }

    questions
}
