//! Description stage: best-effort cleanup and segmentation

use super::{squash, WatchlistRow};

pub fn clean_description(mut row: WatchlistRow) -> WatchlistRow {
    row.description = squash(&row.raw_description);
    row.description_segments = segments(&row.raw_description);
    row
}

/// Split free text on `;`, newlines and sentence boundaries.
///
/// A period ends a sentence only when followed by whitespace and an uppercase
/// letter, so abbreviations like "No. 12" or "Jl. merdeka" stay intact as long
/// as the next word is not capitalized.
pub fn segments(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in text.split(|c| c == ';' || c == '\n' || c == '\r') {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '.' && is_sentence_break(&chars, i) {
                push_segment(&mut out, &chars[start..=i]);
                start = i + 1;
            }
            i += 1;
        }
        push_segment(&mut out, &chars[start.min(chars.len())..]);
    }
    out
}

fn is_sentence_break(chars: &[char], dot: usize) -> bool {
    let mut j = dot + 1;
    if j >= chars.len() || !chars[j].is_whitespace() {
        return false;
    }
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    // Short tokens before the dot are abbreviations ("No.", "Jl.", "Kab.")
    let word_len = chars[..dot]
        .iter()
        .rev()
        .take_while(|c| c.is_alphanumeric())
        .count();
    j < chars.len() && chars[j].is_uppercase() && word_len > 3
}

fn push_segment(out: &mut Vec<String>, chars: &[char]) {
    let segment: String = chars.iter().collect();
    let segment = squash(segment.trim_end_matches('.'));
    let segment = segment.trim_matches(|c: char| c == ',' || c == '-' || c.is_whitespace());
    if !segment.is_empty() {
        out.push(segment.to_string());
    }
}
