//! DTTOT ETL pipeline
//!
//! Turns the bytes of an uploaded watchlist file into normalized rows. Stages
//! run in a fixed order and, apart from `load`, are pure in-memory passes:
//!
//! 1. [`loader`] parses CSV/XLSX into a [`RawTable`] and maps known columns
//! 2. [`names`] splits the name column into first/last name and aliases
//! 3. [`description`] cleans and segments the free-text description
//! 4. [`identifiers`] extracts national ID and passport numbers
//! 5. [`normalize`] canonicalizes birth date, nationality, address, party kind

pub mod description;
pub mod identifiers;
pub mod loader;
pub mod names;
pub mod normalize;

use crate::contract::{FileType, PartyKind};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub use loader::RawTable;

/// Errors that abort a document's processing
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook: {0}")]
    Workbook(String),
    #[error("workbook has no worksheet")]
    EmptyWorkbook,
    #[error("file has no header row")]
    MissingHeader,
    #[error("required column '{0}' not found")]
    MissingColumn(&'static str),
}

/// One watchlist row as it moves through the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchlistRow {
    /// 1-based data row number
    pub row_number: i32,
    pub code: Option<String>,
    pub raw_name: String,
    pub raw_description: String,
    pub raw_kind: String,
    pub raw_birth_place: String,
    pub raw_birth_date: String,
    pub raw_nationality: String,
    pub raw_address: String,

    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub description_segments: Vec<String>,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
    pub party_kind: PartyKind,
    pub birth_place: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub address_fragments: Vec<String>,
}

/// Run every stage over the file contents
pub fn run(bytes: &[u8], file_type: FileType) -> Result<Vec<WatchlistRow>, EtlError> {
    let table = loader::load(bytes, file_type)?;
    let rows = loader::map_columns(&table)?;
    tracing::debug!(rows = rows.len(), "watchlist file loaded");

    let rows: Vec<WatchlistRow> = rows
        .into_iter()
        .map(names::split_names)
        .map(description::clean_description)
        .map(identifiers::extract_identifiers)
        .map(normalize::normalize_row)
        .collect();

    Ok(rows)
}

/// Collapse runs of whitespace and strip wrapping quotes
pub(crate) fn squash(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c| c == '"' || c == '\'' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
        .to_string()
}

/// Compile a literal pattern once
#[allow(clippy::unwrap_used)]
pub(crate) fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
No,Nama,Deskripsi,Terduga,Kode Densus,Tpt Lahir,Tgl Lahir,WN Asal,Alamat
1,\"ABU BAKAR alias ABU BAKAR BA'ASYIR\",\"NIK: 3201 0123 4567 8901; Paspor No. A 1234567. Pemimpin kelompok\",Orang,ID-001,Jombang,17 Agustus 1938,WNI,\"Jl. Merdeka 1, Solo, Jawa Tengah\"
2,JAMAAH ISLAMIYAH,Organisasi terlarang,Korporasi,ID-002,,,Indonesia,
";

    #[test]
    fn test_run_normalizes_sample_csv() {
        let rows = run(SAMPLE.as_bytes(), FileType::Csv).unwrap();
        assert_eq!(rows.len(), 2);

        let person = &rows[0];
        assert_eq!(person.row_number, 1);
        assert_eq!(person.code.as_deref(), Some("ID-001"));
        assert_eq!(person.full_name, "ABU BAKAR");
        assert_eq!(person.first_name, "ABU");
        assert_eq!(person.last_name, "BAKAR");
        assert_eq!(person.aliases, vec!["ABU BAKAR BA'ASYIR".to_string()]);
        assert_eq!(person.national_id.as_deref(), Some("3201012345678901"));
        assert_eq!(person.passport_number.as_deref(), Some("A1234567"));
        assert_eq!(person.birth_date.as_deref(), Some("1938-08-17"));
        assert_eq!(person.nationality.as_deref(), Some("Indonesia"));
        assert_eq!(person.party_kind, PartyKind::Person);
        assert_eq!(person.address_fragments.len(), 3);

        let org = &rows[1];
        assert_eq!(org.party_kind, PartyKind::Organization);
        assert!(org.national_id.is_none());
        assert!(org.birth_date.is_none());
        assert!(org.address.is_none());
    }

    #[test]
    fn test_run_requires_name_column() {
        let err = run(b"foo,bar\n1,2\n", FileType::Csv).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn("name")));
    }

    #[test]
    fn test_squash() {
        assert_eq!(squash("  \"a   b\n c\" "), "a b c");
    }
}
