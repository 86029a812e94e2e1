//! Normalization stage: birth date, nationality, address, party kind

use super::{regex, squash, WatchlistRow};
use crate::contract::PartyKind;
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

fn re_day_month_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})\b")
}

fn re_iso() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(\d{4})-(\d{1,2})-(\d{1,2})")
}

fn re_month_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b(\d{1,2})\s+([A-Za-z]+)\.?\s+(\d{4})\b")
}

pub fn normalize_row(mut row: WatchlistRow) -> WatchlistRow {
    row.birth_date = normalize_birth_date(&row.raw_birth_date);
    row.nationality = normalize_nationality(&row.raw_nationality);
    row.party_kind = normalize_party_kind(&row.raw_kind);
    row.birth_place = non_empty(squash(&row.raw_birth_place));

    let address = squash(&row.raw_address);
    row.address_fragments = address
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    row.address = non_empty(address);
    row
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() || s == "-" {
        None
    } else {
        Some(s)
    }
}

/// Canonical `YYYY-MM-DD`, or `None` when nothing parses
pub fn normalize_birth_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Some(date) = excel_serial(raw) {
        return Some(date);
    }
    if let Some(c) = re_iso().captures(raw) {
        if let Some(date) = ymd(&c[1], &c[2], &c[3]) {
            return Some(date);
        }
    }
    if let Some(c) = re_day_month_year().captures(raw) {
        if let Some(date) = ymd(&c[3], &c[2], &c[1]) {
            return Some(date);
        }
    }
    re_month_name().captures_iter(raw).find_map(|c| {
        let month = month_number(&c[2])?;
        let year: i32 = c[3].parse().ok()?;
        let day: u32 = c[1].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Spreadsheet cells formatted as dates arrive as day counts since 1899-12-30
fn excel_serial(raw: &str) -> Option<NaiveDate> {
    let serial: f64 = raw.parse().ok()?;
    if !(1.0..=2_958_465.0).contains(&serial) || raw.len() == 4 {
        // bare four-digit values are years, not serials
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// English and Indonesian month names and abbreviations
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.as_str() {
        "januari" | "january" | "jan" => 1,
        "februari" | "pebruari" | "february" | "feb" | "peb" => 2,
        "maret" | "march" | "mar" => 3,
        "april" | "apr" => 4,
        "mei" | "may" => 5,
        "juni" | "june" | "jun" => 6,
        "juli" | "july" | "jul" => 7,
        "agustus" | "august" | "aug" | "agu" | "ags" | "agt" => 8,
        "september" | "sept" | "sep" => 9,
        "oktober" | "october" | "okt" | "oct" => 10,
        "november" | "nopember" | "nov" | "nop" => 11,
        "desember" | "december" | "des" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Canonical country name for the common spellings seen in watchlist files
pub fn normalize_nationality(raw: &str) -> Option<String> {
    let cleaned = squash(raw);
    let key = cleaned.to_lowercase();
    let canonical = match key.as_str() {
        "" | "-" | "n/a" | "tidak diketahui" | "unknown" => return None,
        "wni" | "indonesia" | "indonesian" | "republik indonesia" | "ri" => "Indonesia",
        "malaysia" | "malaysian" => "Malaysia",
        "singapura" | "singapore" | "singaporean" => "Singapore",
        "filipina" | "philippines" | "philippine" | "filipino" => "Philippines",
        "australia" | "australian" => "Australia",
        "arab saudi" | "saudi arabia" | "saudi" => "Saudi Arabia",
        "amerika serikat" | "united states" | "usa" | "us" | "american" => "United States",
        "inggris" | "united kingdom" | "uk" | "british" => "United Kingdom",
        "suriah" | "syria" | "syrian" => "Syria",
        "irak" | "iraq" | "iraqi" => "Iraq",
        "mesir" | "egypt" | "egyptian" => "Egypt",
        "pakistan" | "pakistani" => "Pakistan",
        "afganistan" | "afghanistan" | "afghan" => "Afghanistan",
        _ => return Some(title_case(&cleaned)),
    };
    Some(canonical.to_string())
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_party_kind(raw: &str) -> PartyKind {
    let key = raw.trim().to_lowercase();
    match key.as_str() {
        "korporasi" | "organisasi" | "corporation" | "organization" | "organisation"
        | "entity" | "kelompok" | "group" => PartyKind::Organization,
        _ => PartyKind::Person,
    }
}
