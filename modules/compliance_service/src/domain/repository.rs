//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{
    Document, MatchRecord, OtpCode, PartySnapshot, PartyType, User, UserProfile, WatchlistEntry,
    WatchlistReport,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository for uploaded documents
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document; the row is committed when this returns
    async fn create(&self, document: &Document) -> Result<Document>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>>;

    /// List all documents, newest first
    async fn list_all(&self) -> Result<Vec<Document>>;

    async fn update(&self, document: &Document) -> Result<Document>;

    /// Delete a document with its report, match records and watchlist entries.
    /// Returns false when the document did not exist.
    async fn delete_cascade(&self, id: Uuid) -> Result<bool>;
}

/// Repository for watchlist reports and DTTOT entries
#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    async fn create_report(&self, report: &WatchlistReport) -> Result<WatchlistReport>;

    async fn find_report(&self, id: Uuid) -> Result<Option<WatchlistReport>>;

    async fn find_report_by_document(&self, document_id: Uuid) -> Result<Option<WatchlistReport>>;

    async fn list_reports(&self) -> Result<Vec<WatchlistReport>>;

    async fn update_report(&self, report: &WatchlistReport) -> Result<WatchlistReport>;

    /// Delete a report and its match records
    async fn delete_report(&self, id: Uuid) -> Result<()>;

    /// Replace the document's entries and save the report in one transaction
    async fn store_entries(
        &self,
        report: &WatchlistReport,
        entries: &[WatchlistEntry],
    ) -> Result<()>;

    async fn find_entry(&self, id: Uuid) -> Result<Option<WatchlistEntry>>;

    /// Entries of a document ordered by row number
    async fn list_entries(&self, document_id: Uuid) -> Result<Vec<WatchlistEntry>>;
}

/// Repository for per-party-type match records
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Create or update by `(report_id, party_type, external_party_id, matched_code)`
    async fn upsert(&self, record: &MatchRecord) -> Result<MatchRecord>;

    async fn create(&self, record: &MatchRecord) -> Result<MatchRecord>;

    async fn find_by_id(&self, party_type: PartyType, id: Uuid) -> Result<Option<MatchRecord>>;

    async fn list(&self, report_id: Uuid, party_type: PartyType) -> Result<Vec<MatchRecord>>;

    async fn update(&self, record: &MatchRecord) -> Result<MatchRecord>;

    async fn delete(&self, party_type: PartyType, id: Uuid) -> Result<bool>;
}

/// Repository for local copies of external parties
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Upsert keyed by `(party_type, external_party_id)`; returns rows written
    async fn upsert_many(&self, snapshots: &[PartySnapshot]) -> Result<usize>;

    async fn list(&self, party_type: Option<PartyType>) -> Result<Vec<PartySnapshot>>;
}

/// Repository for users and their profiles
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert user and profile atomically
    async fn create_with_profile(&self, user: &User, profile: &UserProfile) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<(User, UserProfile)>>;

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool>;

    async fn mark_email_verified(&self, user_id: Uuid) -> Result<()>;
}

/// Repository for one-time passwords
#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn create(&self, otp: &OtpCode) -> Result<()>;

    /// Unconsumed codes not expired at `now`, newest first
    async fn find_active(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<OtpCode>>;

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
