//! Load stage: bytes to table, table to rows

use super::{squash, EtlError, WatchlistRow};
use crate::contract::FileType;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Header row plus data rows, all cells as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Canonical columns recognized in watchlist files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Code,
    Name,
    Description,
    Kind,
    BirthPlace,
    BirthDate,
    Nationality,
    Address,
}

impl Column {
    /// Map a normalized header to a column
    pub fn from_header(header: &str) -> Option<Self> {
        let column = match header {
            "kode densus" | "kode" | "code" | "densus code" => Column::Code,
            "nama" | "name" | "full name" | "nama lengkap" => Column::Name,
            "deskripsi" | "description" | "keterangan" => Column::Description,
            "terduga" | "type" | "jenis" | "party type" => Column::Kind,
            "tpt lahir" | "tempat lahir" | "birth place" | "place of birth" => Column::BirthPlace,
            "tgl lahir" | "tanggal lahir" | "birth date" | "date of birth" | "dob" => {
                Column::BirthDate
            }
            "wn asal" | "wn" | "kewarganegaraan" | "nationality" | "citizenship" => {
                Column::Nationality
            }
            "alamat" | "address" => Column::Address,
            _ => return None,
        };
        Some(column)
    }
}

/// Parse file bytes according to the declared file type
pub fn load(bytes: &[u8], file_type: FileType) -> Result<RawTable, EtlError> {
    match file_type {
        FileType::Csv => load_csv(bytes),
        FileType::Xlsx => load_workbook(bytes),
    }
}

fn load_csv(bytes: &[u8]) -> Result<RawTable, EtlError> {
    let bytes = bytes.strip_prefix("\u{feff}".as_bytes()).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(bytes))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EtlError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Semicolon-separated exports are common for spreadsheets saved in id-ID locale
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn load_workbook(bytes: &[u8]) -> Result<RawTable, EtlError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| EtlError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(EtlError::EmptyWorkbook)?
        .map_err(|e| EtlError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(EtlError::MissingHeader)?
        .iter()
        .map(|cell| normalize_header(&cell_to_string(cell)))
        .collect::<Vec<_>>();

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Project table cells onto pipeline rows, skipping blank rows
pub fn map_columns(table: &RawTable) -> Result<Vec<WatchlistRow>, EtlError> {
    let index_of = |wanted: Column| {
        table
            .headers
            .iter()
            .position(|h| Column::from_header(h) == Some(wanted))
    };

    let name_idx = index_of(Column::Name).ok_or(EtlError::MissingColumn("name"))?;
    let code_idx = index_of(Column::Code);
    let description_idx = index_of(Column::Description);
    let kind_idx = index_of(Column::Kind);
    let birth_place_idx = index_of(Column::BirthPlace);
    let birth_date_idx = index_of(Column::BirthDate);
    let nationality_idx = index_of(Column::Nationality);
    let address_idx = index_of(Column::Address);

    let mut rows = Vec::new();
    for (i, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .map(|c| squash(c))
                .unwrap_or_default()
        };

        let raw_name = cell(Some(name_idx));
        if raw_name.is_empty() {
            tracing::debug!(row = i + 1, "skipping row without name");
            continue;
        }
        let code = cell(code_idx);

        rows.push(WatchlistRow {
            row_number: (i + 1) as i32,
            code: (!code.is_empty()).then_some(code),
            raw_name,
            raw_description: cell(description_idx),
            raw_kind: cell(kind_idx),
            raw_birth_place: cell(birth_place_idx),
            raw_birth_date: cell(birth_date_idx),
            raw_nationality: cell(nationality_idx),
            raw_address: cell(address_idx),
            ..Default::default()
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_normalizes_headers() {
        let table = load(b"\xef\xbb\xbfNama ,  Tgl   Lahir\nA,1\n", FileType::Csv).unwrap();
        assert_eq!(table.headers, vec!["nama", "tgl lahir"]);
        assert_eq!(table.rows, vec![vec!["A".to_string(), "1".to_string()]]);
    }

    #[test]
    fn test_load_csv_semicolon_delimiter() {
        let table = load(b"nama;alamat\nBUDI;Solo, Jawa Tengah\n", FileType::Csv).unwrap();
        assert_eq!(table.headers, vec!["nama", "alamat"]);
        assert_eq!(table.rows[0][1], "Solo, Jawa Tengah");
    }

    #[test]
    fn test_map_columns_skips_blank_rows() {
        let table = RawTable {
            headers: vec!["name".into(), "code".into()],
            rows: vec![
                vec!["".into(), "".into()],
                vec!["SOMEONE".into(), "X-1".into()],
                vec!["".into(), "X-2".into()],
            ],
        };
        let rows = map_columns(&table).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].code.as_deref(), Some("X-1"));
    }

    #[test]
    fn test_load_rejects_garbage_workbook() {
        let err = load(b"not a workbook", FileType::Xlsx).unwrap_err();
        assert!(matches!(err, EtlError::Workbook(_)));
    }

    #[test]
    fn test_column_aliases() {
        assert_eq!(Column::from_header("kode densus"), Some(Column::Code));
        assert_eq!(Column::from_header("wn asal"), Some(Column::Nationality));
        assert_eq!(Column::from_header("no"), None);
    }
}
