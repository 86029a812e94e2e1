//! Contract models for compliance service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Type tag of documents that feed the DTTOT watchlist workflow
pub const DTTOT_DOCUMENT_TYPE: &str = "DTTOT Document";

/// Uploaded document metadata; file bytes live in file storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    /// Display name, defaults to the uploaded file name
    pub name: String,
    /// Type tag (e.g. "DTTOT Document")
    pub document_type: String,
    pub file_type: FileType,
    /// Key under which the file storage holds the bytes
    pub storage_key: String,
    pub size_bytes: i64,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Whether this document feeds the watchlist workflow
    pub fn is_watchlist(&self) -> bool {
        self.document_type == DTTOT_DOCUMENT_TYPE
    }
}

/// Tabular file formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Csv,
    Xlsx,
}

impl FileType {
    /// Derive the file type from an uploaded file name
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Whether a watchlist row names a person or an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartyKind {
    #[default]
    Person,
    Organization,
}

impl PartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "person" => Some(Self::Person),
            "organization" => Some(Self::Organization),
            _ => None,
        }
    }

    /// Snapshot party types a watchlist row of this kind is matched against
    pub fn candidate_party_types(&self) -> &'static [PartyType] {
        match self {
            Self::Person => &[PartyType::Personal],
            Self::Organization => &[PartyType::Corporate, PartyType::Publisher],
        }
    }
}

/// One row of sanctioned-party data ("DTTOT record")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub uploaded_by: Option<Uuid>,
    /// 1-based data row number in the source file
    pub row_number: i32,
    /// Source code ("Kode Densus") or a generated identifier
    pub code: String,
    pub party_kind: PartyKind,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub description_segments: Vec<String>,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
    pub birth_place: Option<String>,
    /// ISO `YYYY-MM-DD`
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub address_fragments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Processing state of a watchlist report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    Pending,
    Processing,
    Dispatched,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Dispatched => "dispatched",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "dispatched" => Some(Self::Dispatched),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Per-document record tracking match processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistReport {
    pub id: Uuid,
    pub document_id: Uuid,
    pub status: ReportStatus,
    pub status_detail: String,
    pub row_count: i32,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Party type of external snapshots and match records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyType {
    Personal,
    Corporate,
    Publisher,
}

impl PartyType {
    pub const ALL: [PartyType; 3] = [Self::Personal, Self::Corporate, Self::Publisher];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Corporate => "corporate",
            Self::Publisher => "publisher",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(Self::Personal),
            "corporate" => Some(Self::Corporate),
            "publisher" => Some(Self::Publisher),
            _ => None,
        }
    }
}

impl std::fmt::Display for PartyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match between a watchlist entry and an external party
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub id: Uuid,
    pub report_id: Uuid,
    pub party_type: PartyType,
    pub external_party_id: String,
    pub watchlist_entry_id: Option<Uuid>,
    /// Watchlist code the party matched
    pub matched_code: String,
    /// Always within `[0.0, 1.0]`
    pub similarity_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Latest known copy of an external party
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartySnapshot {
    pub id: Uuid,
    pub party_type: PartyType,
    pub external_party_id: String,
    pub name: String,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub synced_at: DateTime<Utc>,
}

/// Platform account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// `salt$sha256hex`
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Extended profile, one per user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Stored one-time password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
