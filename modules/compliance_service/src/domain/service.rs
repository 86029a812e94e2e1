//! Domain service - business logic orchestration

use super::credentials::hash_password;
use super::events::{DocumentEvent, EventPublisher};
use super::files::{document_key, FileStorage};
use super::jobs::{Job, JobQueue};
use super::otp::OtpService;
use super::repository::{
    DocumentRepository, MatchRepository, OtpRepository, SnapshotRepository, UserRepository,
    WatchlistRepository,
};
use super::validation::{
    validate_document_fields, validate_match_input, validate_new_user, validate_sync_request,
    MatchInput,
};
use crate::contract::{
    ComplianceError, Document, FileType, MatchRecord, NewUser, PartySnapshot, PartyType,
    ReportStatus, User, UserProfile, WatchlistEntry, WatchlistReport,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Repository set the service works against
#[derive(Clone)]
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub watchlist: Arc<dyn WatchlistRepository>,
    pub matches: Arc<dyn MatchRepository>,
    pub snapshots: Arc<dyn SnapshotRepository>,
    pub users: Arc<dyn UserRepository>,
    pub otps: Arc<dyn OtpRepository>,
}

/// Uploaded document before it is stored
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Display name; the file name is used when absent
    pub name: Option<String>,
    pub document_type: String,
    pub file_name: String,
    pub bytes: Bytes,
}

/// Partial update of a watchlist report
#[derive(Debug, Clone, Default)]
pub struct ReportUpdate {
    pub status: Option<ReportStatus>,
    pub status_detail: Option<String>,
}

/// Domain service for documents, watchlist reports, matches and users
pub struct Service {
    repos: Repositories,
    files: Arc<dyn FileStorage>,
    events: Arc<dyn EventPublisher>,
    jobs: Arc<dyn JobQueue>,
    otp: OtpService,
    max_upload_bytes: usize,
}

impl Service {
    pub fn new(
        repos: Repositories,
        files: Arc<dyn FileStorage>,
        events: Arc<dyn EventPublisher>,
        jobs: Arc<dyn JobQueue>,
        otp: OtpService,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            repos,
            files,
            events,
            jobs,
            otp,
            max_upload_bytes,
        }
    }

    // ===== Documents =====

    /// Store the file and create the document row.
    ///
    /// For DTTOT documents the creation event is published once the row is
    /// committed; a failed publish is logged and does not fail the upload.
    pub async fn create_document(
        &self,
        upload: NewDocument,
        user_id: Option<Uuid>,
    ) -> Result<Document, ComplianceError> {
        let name = upload
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&upload.file_name)
            .to_string();
        validate_document_fields(&upload.document_type, &name)?;

        let file_type = FileType::from_file_name(&upload.file_name).ok_or_else(|| {
            ComplianceError::invalid_field("file", "only .csv, .xlsx and .xls files are accepted")
        })?;
        if upload.bytes.is_empty() {
            return Err(ComplianceError::invalid_field("file", "file is empty"));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(ComplianceError::invalid_field(
                "file",
                format!("file exceeds {} bytes", self.max_upload_bytes),
            ));
        }

        let id = Uuid::new_v4();
        let storage_key = document_key(id, &upload.file_name);
        let size_bytes = upload.bytes.len() as i64;
        self.files
            .save(&storage_key, upload.bytes)
            .await
            .map_err(ComplianceError::internal)?;

        let now = Utc::now();
        let document = Document {
            id,
            name,
            document_type: upload.document_type.trim().to_string(),
            file_type,
            storage_key,
            size_bytes,
            created_by: user_id,
            updated_by: user_id,
            created_at: now,
            updated_at: now,
        };

        let document = match self.repos.documents.create(&document).await {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&document.storage_key).await {
                    tracing::warn!(key = %document.storage_key, error = %cleanup, "failed to remove orphaned upload");
                }
                return Err(ComplianceError::internal(e));
            }
        };

        tracing::info!(
            document_id = %document.id,
            document_type = %document.document_type,
            size_bytes = document.size_bytes,
            "document created"
        );

        if document.is_watchlist() {
            if let Err(e) = self.events.publish(DocumentEvent::created(&document)).await {
                tracing::error!(document_id = %document.id, error = %e, "failed to publish document event");
            }
        }

        Ok(document)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Document, ComplianceError> {
        self.repos
            .documents
            .find_by_id(id)
            .await
            .map_err(ComplianceError::internal)?
            .ok_or_else(|| ComplianceError::not_found("document", id))
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, ComplianceError> {
        self.repos
            .documents
            .list_all()
            .await
            .map_err(ComplianceError::internal)
    }

    /// Rename a document. The type tag is fixed at creation and no event is raised.
    pub async fn update_document(
        &self,
        id: Uuid,
        name: &str,
        user_id: Option<Uuid>,
    ) -> Result<Document, ComplianceError> {
        let mut document = self.get_document(id).await?;
        validate_document_fields(&document.document_type, name)?;

        document.name = name.trim().to_string();
        document.updated_by = user_id.or(document.updated_by);
        document.updated_at = Utc::now();

        self.repos
            .documents
            .update(&document)
            .await
            .map_err(ComplianceError::internal)
    }

    /// Delete a document with its report, match records, entries and file
    pub async fn delete_document(&self, id: Uuid) -> Result<(), ComplianceError> {
        let document = self.get_document(id).await?;

        let deleted = self
            .repos
            .documents
            .delete_cascade(id)
            .await
            .map_err(ComplianceError::internal)?;
        if !deleted {
            return Err(ComplianceError::not_found("document", id));
        }

        if let Err(e) = self.files.delete(&document.storage_key).await {
            tracing::warn!(document_id = %id, error = %e, "document deleted but file removal failed");
        }
        tracing::info!(document_id = %id, "document deleted");
        Ok(())
    }

    // ===== Watchlist reports =====

    pub async fn list_reports(&self) -> Result<Vec<WatchlistReport>, ComplianceError> {
        self.repos
            .watchlist
            .list_reports()
            .await
            .map_err(ComplianceError::internal)
    }

    pub async fn get_report(&self, id: Uuid) -> Result<WatchlistReport, ComplianceError> {
        self.repos
            .watchlist
            .find_report(id)
            .await
            .map_err(ComplianceError::internal)?
            .ok_or_else(|| ComplianceError::not_found("watchlist_report", id))
    }

    pub async fn get_report_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<WatchlistReport, ComplianceError> {
        self.repos
            .watchlist
            .find_report_by_document(document_id)
            .await
            .map_err(ComplianceError::internal)?
            .ok_or_else(|| ComplianceError::not_found("watchlist_report", document_id))
    }

    /// Create an empty `pending` report; a document has at most one
    pub async fn create_report(
        &self,
        document_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<WatchlistReport, ComplianceError> {
        self.get_document(document_id).await?;

        if self
            .repos
            .watchlist
            .find_report_by_document(document_id)
            .await
            .map_err(ComplianceError::internal)?
            .is_some()
        {
            return Err(ComplianceError::Conflict {
                reason: format!("document {} already has a watchlist report", document_id),
            });
        }

        let now = Utc::now();
        let report = WatchlistReport {
            id: Uuid::new_v4(),
            document_id,
            status: ReportStatus::Pending,
            status_detail: String::new(),
            row_count: 0,
            updated_by: user_id,
            created_at: now,
            updated_at: now,
        };
        self.repos
            .watchlist
            .create_report(&report)
            .await
            .map_err(ComplianceError::internal)
    }

    pub async fn update_report(
        &self,
        id: Uuid,
        update: ReportUpdate,
        user_id: Option<Uuid>,
    ) -> Result<WatchlistReport, ComplianceError> {
        let mut report = self.get_report(id).await?;
        if let Some(status) = update.status {
            report.status = status;
        }
        if let Some(detail) = update.status_detail {
            report.status_detail = detail;
        }
        report.updated_by = user_id.or(report.updated_by);
        report.updated_at = Utc::now();

        self.repos
            .watchlist
            .update_report(&report)
            .await
            .map_err(ComplianceError::internal)
    }

    /// Delete a report together with its match records
    pub async fn delete_report(&self, id: Uuid) -> Result<(), ComplianceError> {
        self.get_report(id).await?;
        self.repos
            .watchlist
            .delete_report(id)
            .await
            .map_err(ComplianceError::internal)
    }

    /// DTTOT records of the report's document, in file order
    pub async fn list_entries(&self, report_id: Uuid) -> Result<Vec<WatchlistEntry>, ComplianceError> {
        let report = self.get_report(report_id).await?;
        self.repos
            .watchlist
            .list_entries(report.document_id)
            .await
            .map_err(ComplianceError::internal)
    }

    // ===== Match records =====

    pub async fn list_matches(
        &self,
        report_id: Uuid,
        party_type: PartyType,
    ) -> Result<Vec<MatchRecord>, ComplianceError> {
        self.get_report(report_id).await?;
        self.repos
            .matches
            .list(report_id, party_type)
            .await
            .map_err(ComplianceError::internal)
    }

    pub async fn get_match(
        &self,
        party_type: PartyType,
        id: Uuid,
    ) -> Result<MatchRecord, ComplianceError> {
        self.repos
            .matches
            .find_by_id(party_type, id)
            .await
            .map_err(ComplianceError::internal)?
            .ok_or_else(|| ComplianceError::not_found(&format!("{}_match", party_type), id))
    }

    pub async fn create_match(
        &self,
        report_id: Uuid,
        party_type: PartyType,
        input: MatchInput,
    ) -> Result<MatchRecord, ComplianceError> {
        validate_match_input(&input)?;
        self.get_report(report_id).await?;
        self.check_entry(input.watchlist_entry_id).await?;

        let existing = self
            .repos
            .matches
            .list(report_id, party_type)
            .await
            .map_err(ComplianceError::internal)?;
        if existing.iter().any(|m| {
            m.external_party_id == input.external_party_id && m.matched_code == input.matched_code
        }) {
            return Err(ComplianceError::Conflict {
                reason: format!(
                    "{} match for party {} and code {} already exists",
                    party_type, input.external_party_id, input.matched_code
                ),
            });
        }

        let now = Utc::now();
        let record = MatchRecord {
            id: Uuid::new_v4(),
            report_id,
            party_type,
            external_party_id: input.external_party_id.trim().to_string(),
            watchlist_entry_id: input.watchlist_entry_id,
            matched_code: input.matched_code.trim().to_string(),
            similarity_score: input.similarity_score,
            created_at: now,
            updated_at: now,
        };
        self.repos
            .matches
            .create(&record)
            .await
            .map_err(ComplianceError::internal)
    }

    pub async fn update_match(
        &self,
        party_type: PartyType,
        id: Uuid,
        input: MatchInput,
    ) -> Result<MatchRecord, ComplianceError> {
        validate_match_input(&input)?;
        let mut record = self.get_match(party_type, id).await?;
        self.check_entry(input.watchlist_entry_id).await?;

        record.external_party_id = input.external_party_id.trim().to_string();
        record.matched_code = input.matched_code.trim().to_string();
        record.similarity_score = input.similarity_score;
        record.watchlist_entry_id = input.watchlist_entry_id;
        record.updated_at = Utc::now();

        self.repos
            .matches
            .update(&record)
            .await
            .map_err(ComplianceError::internal)
    }

    pub async fn delete_match(&self, party_type: PartyType, id: Uuid) -> Result<(), ComplianceError> {
        let deleted = self
            .repos
            .matches
            .delete(party_type, id)
            .await
            .map_err(ComplianceError::internal)?;
        if !deleted {
            return Err(ComplianceError::not_found(&format!("{}_match", party_type), id));
        }
        Ok(())
    }

    async fn check_entry(&self, entry_id: Option<Uuid>) -> Result<(), ComplianceError> {
        let Some(entry_id) = entry_id else {
            return Ok(());
        };
        match self
            .repos
            .watchlist
            .find_entry(entry_id)
            .await
            .map_err(ComplianceError::internal)?
        {
            Some(_) => Ok(()),
            None => Err(ComplianceError::invalid_field(
                "watchlist_entry_id",
                format!("watchlist entry {} does not exist", entry_id),
            )),
        }
    }

    // ===== External snapshots =====

    pub async fn list_snapshots(
        &self,
        party_type: Option<PartyType>,
    ) -> Result<Vec<PartySnapshot>, ComplianceError> {
        self.repos
            .snapshots
            .list(party_type)
            .await
            .map_err(ComplianceError::internal)
    }

    /// Queue a snapshot sync for one party type, or all when `None`
    pub async fn request_snapshot_sync(
        &self,
        party_type: Option<PartyType>,
        ids: Option<Vec<String>>,
    ) -> Result<(), ComplianceError> {
        validate_sync_request(party_type, ids.as_deref())?;
        let targeted = ids.as_ref().map(Vec::len);
        self.jobs
            .enqueue(Job::SyncExternalSnapshots { party_type, ids })
            .await
            .map_err(ComplianceError::internal)?;
        tracing::info!(party_type = ?party_type.map(|p| p.as_str()), ids = ?targeted, "snapshot sync queued");
        Ok(())
    }

    // ===== Users =====

    /// Create a user and its profile in one transaction
    pub async fn register_user(
        &self,
        new_user: NewUser,
    ) -> Result<(User, UserProfile), ComplianceError> {
        validate_new_user(&new_user)?;
        let username = new_user.username.trim().to_string();
        let email = new_user.email.trim().to_lowercase();

        if self
            .repos
            .users
            .username_or_email_taken(&username, &email)
            .await
            .map_err(ComplianceError::internal)?
        {
            return Err(ComplianceError::Conflict {
                reason: "username or email already registered".to_string(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: hash_password(&new_user.password),
            is_active: true,
            created_at: now,
        };
        let profile = UserProfile {
            user_id: user.id,
            full_name: new_user.full_name.trim().to_string(),
            phone: new_user
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            email_verified: false,
            created_at: now,
            updated_at: now,
        };

        self.repos
            .users
            .create_with_profile(&user, &profile)
            .await
            .map_err(ComplianceError::internal)?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok((user, profile))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<(User, UserProfile), ComplianceError> {
        self.repos
            .users
            .find_by_id(id)
            .await
            .map_err(ComplianceError::internal)?
            .ok_or_else(|| ComplianceError::not_found("user", id))
    }

    /// Email a fresh one-time code; returns its expiry
    pub async fn request_otp(&self, user_id: Uuid) -> Result<DateTime<Utc>, ComplianceError> {
        self.otp.request(user_id).await
    }

    pub async fn verify_otp(&self, user_id: Uuid, code: &str) -> Result<(), ComplianceError> {
        self.otp.verify(user_id, code).await
    }
}
