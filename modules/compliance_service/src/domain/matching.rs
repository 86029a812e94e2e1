//! Similarity scoring between watchlist entries and external parties

use crate::contract::{PartySnapshot, WatchlistEntry};
use strsim::{jaro_winkler, normalized_levenshtein};

/// Strategy for calculating similarity between two names
///
/// Returns a value between 0.0 (completely different) and 1.0 (identical).
pub trait SimilarityStrategy: Send + Sync {
    fn calculate(&self, a: &str, b: &str) -> f64;

    fn name(&self) -> &'static str;
}

/// Jaro-Winkler (70%) blended with normalized Levenshtein (30%)
#[derive(Debug, Clone, Default)]
pub struct HybridNameStrategy;

impl SimilarityStrategy for HybridNameStrategy {
    fn calculate(&self, a: &str, b: &str) -> f64 {
        clamp_score(0.7 * jaro_winkler(a, b) + 0.3 * normalized_levenshtein(a, b))
    }

    fn name(&self) -> &'static str {
        "HybridName"
    }
}

/// Keep scores inside `[0, 1]`; NaN collapses to 0
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Uppercase ASCII letters and digits with single spaces; honorifics and
/// legal-form tokens removed
pub fn normalize_name(name: &str) -> String {
    const NOISE: &[&str] = &[
        "PT", "CV", "TBK", "YAYASAN", "HAJI", "H", "HJ", "DR", "IR", "USTADZ", "USTAD", "KH",
    ];
    name.to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|token| !NOISE.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scores entries against snapshots
pub struct Matcher {
    strategy: Box<dyn SimilarityStrategy>,
    threshold: f64,
}

impl Matcher {
    pub fn new(strategy: Box<dyn SimilarityStrategy>, threshold: f64) -> Self {
        Self {
            strategy,
            threshold: clamp_score(threshold),
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self::new(Box::new(HybridNameStrategy), threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score in `[0, 1]`. Equal identity documents are a certain match,
    /// otherwise the best name similarity over the primary name and aliases.
    pub fn score(&self, entry: &WatchlistEntry, snapshot: &PartySnapshot) -> f64 {
        if same_identifier(&entry.national_id, &snapshot.national_id)
            || same_identifier(&entry.passport_number, &snapshot.passport_number)
        {
            return 1.0;
        }

        let target = normalize_name(&snapshot.name);
        if target.is_empty() {
            return 0.0;
        }
        std::iter::once(&entry.full_name)
            .chain(entry.aliases.iter())
            .map(|name| normalize_name(name))
            .filter(|name| !name.is_empty())
            .map(|name| self.strategy.calculate(&name, &target))
            .map(clamp_score)
            .fold(0.0, f64::max)
    }

    /// Snapshots scoring at or above the threshold, best first
    pub fn candidates<'a>(
        &self,
        entry: &WatchlistEntry,
        snapshots: &'a [PartySnapshot],
    ) -> Vec<(&'a PartySnapshot, f64)> {
        let mut hits: Vec<(&PartySnapshot, f64)> = snapshots
            .iter()
            .map(|s| (s, self.score(entry, s)))
            .filter(|(_, score)| *score >= self.threshold)
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        tracing::trace!(
            strategy = self.strategy.name(),
            entry = %entry.code,
            hits = hits.len(),
            "scored watchlist entry"
        );
        hits
    }
}

fn same_identifier(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let a = a.trim();
            !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{PartyKind, PartyType};
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(name: &str, aliases: &[&str]) -> WatchlistEntry {
        WatchlistEntry {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            uploaded_by: None,
            row_number: 1,
            code: "ID-001".to_string(),
            party_kind: PartyKind::Person,
            full_name: name.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            description: String::new(),
            description_segments: vec![],
            national_id: None,
            passport_number: None,
            birth_place: None,
            birth_date: None,
            nationality: None,
            address: None,
            address_fragments: vec![],
            created_at: Utc::now(),
        }
    }

    fn snapshot(name: &str) -> PartySnapshot {
        PartySnapshot {
            id: Uuid::new_v4(),
            party_type: PartyType::Personal,
            external_party_id: "42".to_string(),
            name: name.to_string(),
            national_id: None,
            passport_number: None,
            birth_date: None,
            nationality: None,
            email: None,
            synced_at: Utc::now(),
        }
    }

    #[test]
    fn test_identical_names_score_one() {
        let matcher = Matcher::with_threshold(0.85);
        let score = matcher.score(&entry("Abu Bakar", &[]), &snapshot("ABU  BAKAR"));
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_alias_match_is_used() {
        let matcher = Matcher::with_threshold(0.85);
        let e = entry("Someone Else", &["Joko Pitono"]);
        assert!(matcher.score(&e, &snapshot("Joko Pitono")) > 0.99);
    }

    #[test]
    fn test_identifier_match_wins() {
        let matcher = Matcher::with_threshold(0.85);
        let mut e = entry("Totally Different", &[]);
        e.national_id = Some("3201012345678901".into());
        let mut s = snapshot("Nobody");
        s.national_id = Some("3201012345678901".into());
        assert_eq!(matcher.score(&e, &s), 1.0);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let matcher = Matcher::with_threshold(0.0);
        let names = ["", "A", "Abu", "Abu Bakar Ba'asyir", "PT Maju Jaya Tbk", "zzzz"];
        for a in names {
            for b in names {
                let score = matcher.score(&entry(a, &[]), &snapshot(b));
                assert!((0.0..=1.0).contains(&score), "{a} vs {b}: {score}");
            }
        }
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(1.5), 1.0);
        assert_eq!(clamp_score(-0.2), 0.0);
    }

    #[test]
    fn test_candidates_filter_and_sort() {
        let matcher = Matcher::with_threshold(0.85);
        let snaps = vec![snapshot("Budi Santoso"), snapshot("Abu Bakar"), snapshot("Abu Bakr")];
        let hits = matcher.candidates(&entry("Abu Bakar", &[]), &snaps);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].0.name, "Abu Bakar");
        assert!(hits.iter().all(|(s, _)| s.name != "Budi Santoso"));
    }

    #[test]
    fn test_normalize_name_strips_noise() {
        assert_eq!(normalize_name("PT. Maju-Jaya, Tbk"), "MAJU JAYA");
        assert_eq!(normalize_name("H. Abu Bakar"), "ABU BAKAR");
    }
}
