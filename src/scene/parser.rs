use super::Segment;
use crate::error::{Result, VideoError};
use regex::Regex;
use std::sync::OnceLock;

/// Scene labels the model likes to put in front of image tags.
const SCENE_PREFIXES: [&str; 4] = ["Scene:", "Final shot:", "Opening:", "Shot:"];

/// Splits raw script text into segments.
///
/// Lines are trimmed and blank lines dropped; the remaining lines must
/// alternate image prompt and narration, so an odd count is rejected.
pub fn parse_script(text: &str) -> Result<Vec<Segment>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() % 2 != 0 {
        return Err(VideoError::MalformedScript {
            line_count: lines.len(),
        });
    }

    Ok(lines
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| Segment::new(i + 1, clean_prompt(pair[0]), pair[1].to_string()))
        .collect())
}

/// Strips tag brackets and at most one known scene label from a prompt line.
pub fn clean_prompt(raw: &str) -> String {
    let raw = raw.trim_matches(|c: char| c == '[' || c == ']').trim();
    for prefix in SCENE_PREFIXES {
        let matches = raw
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return raw[prefix.len()..].trim().to_string();
        }
    }
    raw.to_string()
}

/// Forces a line break after every bracketed tag so that tag and narration
/// never share a line.
pub fn normalize_generated_script(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"(\[[^\]]+\])\s+").expect("valid tag regex"));
    tag.replace_all(text.trim(), "$1\n").into_owned()
}
