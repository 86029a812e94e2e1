//! REST DTOs with serde derives for HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ===== Document DTOs =====

/// Document response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentDto {
    pub id: Uuid,
    #[schema(example = "Daftar DTTOT 2024.xlsx")]
    pub name: String,
    #[schema(example = "DTTOT Document")]
    pub document_type: String,
    /// `csv` or `xlsx`
    pub file_type: String,
    pub size_bytes: i64,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentsListResponse {
    pub items: Vec<DocumentDto>,
    pub total: usize,
}

/// Rename request; the type tag cannot change
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    pub name: String,
}

// ===== Report DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDto {
    pub id: Uuid,
    pub document_id: Uuid,
    /// `pending`, `processing`, `dispatched` or `failed`
    pub status: String,
    pub status_detail: String,
    pub row_count: i32,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportsListResponse {
    pub items: Vec<ReportDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateReportRequest {
    pub document_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_detail: Option<String>,
}

// ===== Watchlist entry DTOs =====

/// Normalized DTTOT record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryDto {
    pub id: Uuid,
    pub document_id: Uuid,
    pub row_number: i32,
    #[schema(example = "IDD-0123")]
    pub code: String,
    /// `person` or `organization`
    pub party_kind: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub description_segments: Vec<String>,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
    pub birth_place: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub address_fragments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntriesListResponse {
    pub items: Vec<EntryDto>,
    pub total: usize,
}

// ===== Match DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchDto {
    pub id: Uuid,
    pub report_id: Uuid,
    /// `personal`, `corporate` or `publisher`
    pub party_type: String,
    pub external_party_id: String,
    pub watchlist_entry_id: Option<Uuid>,
    pub matched_code: String,
    #[schema(minimum = 0.0, maximum = 1.0)]
    pub similarity_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchesListResponse {
    pub items: Vec<MatchDto>,
    pub total: usize,
}

/// Create or replace the fields of a match record
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MatchRequest {
    pub external_party_id: String,
    pub matched_code: String,
    pub similarity_score: f64,
    #[serde(default)]
    pub watchlist_entry_id: Option<Uuid>,
}

// ===== Snapshot DTOs =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SnapshotDto {
    pub id: Uuid,
    pub party_type: String,
    pub external_party_id: String,
    pub name: String,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SnapshotsListResponse {
    pub items: Vec<SnapshotDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SyncSnapshotsRequest {
    /// Limit the sync to one party type
    #[serde(default)]
    pub party_type: Option<String>,
    /// Sync only these external ids of `party_type`; one missing id aborts the batch
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncAcceptedResponse {
    #[schema(example = "queued")]
    pub status: String,
    pub party_type: Option<String>,
}

// ===== User DTOs =====

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileDto {
    pub full_name: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub updated_at: DateTime<Utc>,
}

/// User with its profile; the password hash is never returned
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub profile: ProfileDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OtpIssuedResponse {
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "042917")]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
