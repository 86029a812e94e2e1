//! Name stage: primary name, aliases, first/last name

use super::{regex, squash, WatchlistRow};
use regex::Regex;
use std::sync::OnceLock;

fn re_alias_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)\s+(?:alias|a\.k\.a\.?|aka)\s+")
}

fn re_list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "1. NAME" or "a. NAME" prefixes left over from numbered lists
    regex(&RE, r"^(?:\d{1,3}|[a-z])[.)]\s+")
}

/// Split `raw_name` into the primary name and its aliases
pub fn split_names(mut row: WatchlistRow) -> WatchlistRow {
    let mut parts = re_alias_separator()
        .split(&row.raw_name)
        .map(|p| squash(&re_list_marker().replace(p.trim(), "")))
        .filter(|p| !p.is_empty());

    let full_name = parts.next().unwrap_or_default();
    let mut aliases: Vec<String> = Vec::new();
    for alias in parts {
        if alias != full_name && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    }

    let (first_name, last_name) = first_and_last(&full_name);
    row.full_name = full_name;
    row.first_name = first_name;
    row.last_name = last_name;
    row.aliases = aliases;
    row
}

/// First token is the first name, the rest is the last name
pub fn first_and_last(name: &str) -> (String, String) {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}
