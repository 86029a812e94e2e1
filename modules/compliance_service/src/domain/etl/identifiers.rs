//! Identifier stage: national ID (NIK) and passport numbers
//!
//! Extraction never fails; a field without a confident match stays empty.

use super::{regex, WatchlistRow};
use regex::Regex;
use std::sync::OnceLock;

/// Indonesian NIK length
const NATIONAL_ID_DIGITS: usize = 16;

fn re_exact_national_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b\d{16}\b")
}

fn re_digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // digits with single space/dot/dash separators in between
    regex(&RE, r"\d(?:[ .\-]?\d)+")
}

fn re_passport_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)(?:paspor|passport)(?:\s*(?:no|nomor|number|num)\.?)?\s*[:.]?\s*([a-z]{1,2}\s?\d{6,8})\b",
    )
}

fn re_passport_bare() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([A-Z]{1,2}\d{6,8})\b")
}

pub fn extract_identifiers(mut row: WatchlistRow) -> WatchlistRow {
    let haystack = format!("{} {}", row.raw_description, row.raw_name);
    row.national_id = extract_national_id(&haystack);
    row.passport_number = extract_passport(&haystack);
    row
}

/// First standalone 16-digit number, allowing separators inside the run
pub fn extract_national_id(text: &str) -> Option<String> {
    if let Some(m) = re_exact_national_id().find(text) {
        return Some(m.as_str().to_string());
    }
    re_digit_run().find_iter(text).find_map(|m| {
        let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
        (digits.len() == NATIONAL_ID_DIGITS).then_some(digits)
    })
}

/// Passport number, preferring one introduced by a passport keyword
pub fn extract_passport(text: &str) -> Option<String> {
    let keyed = re_passport_keyword()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace(char::is_whitespace, "").to_uppercase());
    keyed.or_else(|| {
        re_passport_bare()
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}
