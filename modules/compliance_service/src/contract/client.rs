//! Native client trait for inter-module communication
//!
//! Other modules read compliance state through this trait with direct calls,
//! no HTTP involved.

use super::{
    error::ComplianceError,
    model::{Document, MatchRecord, PartySnapshot, PartyType, User, UserProfile, WatchlistReport},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Compliance service API for inter-module communication
#[async_trait]
pub trait ComplianceApi: Send + Sync {
    // ===== Documents =====

    /// Get a document by id
    async fn get_document(&self, id: Uuid) -> Result<Document, ComplianceError>;

    /// List all documents, newest first
    async fn list_documents(&self) -> Result<Vec<Document>, ComplianceError>;

    // ===== Reports =====

    /// Get the watchlist report produced for a document
    async fn get_report_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<WatchlistReport, ComplianceError>;

    /// List match records of one party type for a report
    async fn list_matches(
        &self,
        report_id: Uuid,
        party_type: PartyType,
    ) -> Result<Vec<MatchRecord>, ComplianceError>;

    // ===== External snapshots =====

    /// List local snapshots of external parties
    async fn list_snapshots(
        &self,
        party_type: Option<PartyType>,
    ) -> Result<Vec<PartySnapshot>, ComplianceError>;

    // ===== Users =====

    /// Get a user together with its profile
    async fn get_user(&self, id: Uuid) -> Result<(User, UserProfile), ComplianceError>;
}
