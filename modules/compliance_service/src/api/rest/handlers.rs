//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::Problem,
    extract::{ApiJson, ApiPath, ApiQuery},
    mapper::{parse_party_type, parse_report_status},
};
use crate::domain::{NewDocument, ReportUpdate, Service};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the acting user's id
pub const USER_HEADER: &str = "x-user-id";

fn acting_user(headers: &HeaderMap) -> Result<Option<Uuid>, Problem> {
    let Some(value) = headers.get(USER_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| Problem::bad_request(format!("{} is not valid text", USER_HEADER)))?;
    Uuid::parse_str(raw.trim())
        .map(Some)
        .map_err(|_| Problem::bad_request(format!("{} must be a UUID", USER_HEADER)))
}

// ===== Documents =====

pub async fn list_documents(
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<DocumentsListResponse>, Problem> {
    let items: Vec<DocumentDto> = service
        .list_documents()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();
    Ok(Json(DocumentsListResponse { items, total }))
}

/// Multipart upload with fields `document_type`, optional `name`, and `file`
pub async fn upload_document(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<DocumentDto>), Problem> {
    let user_id = acting_user(&headers)?;
    let mut multipart = multipart.map_err(|e| Problem::bad_request(e.body_text()))?;

    let mut document_type = None;
    let mut name = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Problem::bad_request(format!("invalid multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "document_type" => {
                document_type = Some(field.text().await.map_err(|e| {
                    Problem::bad_request(format!("invalid document_type field: {}", e))
                })?);
            }
            "name" => {
                name = Some(field.text().await.map_err(|e| {
                    Problem::bad_request(format!("invalid name field: {}", e))
                })?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Problem::bad_request(format!("invalid file field: {}", e)))?;
                file = Some((file_name, bytes));
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(crate::contract::ComplianceError::invalid_field("file", "is required").into());
    };
    let document_type = document_type.unwrap_or_default();

    let document = service
        .create_document(
            NewDocument {
                name,
                document_type,
                file_name,
                bytes,
            },
            user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

pub async fn get_document(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DocumentDto>, Problem> {
    Ok(Json(service.get_document(id).await?.into()))
}

pub async fn update_document(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateDocumentRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let user_id = acting_user(&headers)?;
    let document = service.update_document(id, &req.name, user_id).await?;
    Ok(Json(document.into()))
}

pub async fn delete_document(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, Problem> {
    service.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Watchlist reports =====

pub async fn list_reports(
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<ReportsListResponse>, Problem> {
    let items: Vec<ReportDto> = service
        .list_reports()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();
    Ok(Json(ReportsListResponse { items, total }))
}

pub async fn create_report(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportDto>), Problem> {
    let user_id = acting_user(&headers)?;
    let report = service.create_report(req.document_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(report.into())))
}

pub async fn get_report(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ReportDto>, Problem> {
    Ok(Json(service.get_report(id).await?.into()))
}

pub async fn update_report(
    Extension(service): Extension<Arc<Service>>,
    headers: HeaderMap,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateReportRequest>,
) -> Result<Json<ReportDto>, Problem> {
    let user_id = acting_user(&headers)?;
    let status = req.status.as_deref().map(parse_report_status).transpose()?;
    let report = service
        .update_report(
            id,
            ReportUpdate {
                status,
                status_detail: req.status_detail,
            },
            user_id,
        )
        .await?;
    Ok(Json(report.into()))
}

pub async fn delete_report(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, Problem> {
    service.delete_report(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_entries(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<EntriesListResponse>, Problem> {
    let items: Vec<EntryDto> = service
        .list_entries(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();
    Ok(Json(EntriesListResponse { items, total }))
}

// ===== Match records =====

pub async fn list_matches(
    Extension(service): Extension<Arc<Service>>,
    ApiPath((report_id, party_type)): ApiPath<(Uuid, String)>,
) -> Result<Json<MatchesListResponse>, Problem> {
    let party_type = parse_party_type(&party_type)?;
    let items: Vec<MatchDto> = service
        .list_matches(report_id, party_type)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();
    Ok(Json(MatchesListResponse { items, total }))
}

pub async fn create_match(
    Extension(service): Extension<Arc<Service>>,
    ApiPath((report_id, party_type)): ApiPath<(Uuid, String)>,
    ApiJson(req): ApiJson<MatchRequest>,
) -> Result<(StatusCode, Json<MatchDto>), Problem> {
    let party_type = parse_party_type(&party_type)?;
    let record = service
        .create_match(report_id, party_type, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn get_match(
    Extension(service): Extension<Arc<Service>>,
    ApiPath((party_type, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<MatchDto>, Problem> {
    let party_type = parse_party_type(&party_type)?;
    Ok(Json(service.get_match(party_type, id).await?.into()))
}

pub async fn update_match(
    Extension(service): Extension<Arc<Service>>,
    ApiPath((party_type, id)): ApiPath<(String, Uuid)>,
    ApiJson(req): ApiJson<MatchRequest>,
) -> Result<Json<MatchDto>, Problem> {
    let party_type = parse_party_type(&party_type)?;
    let record = service.update_match(party_type, id, req.into()).await?;
    Ok(Json(record.into()))
}

pub async fn delete_match(
    Extension(service): Extension<Arc<Service>>,
    ApiPath((party_type, id)): ApiPath<(String, Uuid)>,
) -> Result<StatusCode, Problem> {
    let party_type = parse_party_type(&party_type)?;
    service.delete_match(party_type, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== External snapshots =====

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub party_type: Option<String>,
}

pub async fn list_snapshots(
    Extension(service): Extension<Arc<Service>>,
    ApiQuery(query): ApiQuery<SnapshotQuery>,
) -> Result<Json<SnapshotsListResponse>, Problem> {
    let party_type = query.party_type.as_deref().map(parse_party_type).transpose()?;
    let items: Vec<SnapshotDto> = service
        .list_snapshots(party_type)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = items.len();
    Ok(Json(SnapshotsListResponse { items, total }))
}

/// Queue a sync; the body is optional
pub async fn sync_snapshots(
    Extension(service): Extension<Arc<Service>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SyncAcceptedResponse>), Problem> {
    let req: SyncSnapshotsRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SyncSnapshotsRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Problem::bad_request(format!("invalid JSON body: {}", e)))?
    };
    let party_type = req.party_type.as_deref().map(parse_party_type).transpose()?;
    service.request_snapshot_sync(party_type, req.ids).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SyncAcceptedResponse {
            status: "queued".to_string(),
            party_type: party_type.map(|p| p.as_str().to_string()),
        }),
    ))
}

// ===== Users =====

pub async fn register_user(
    Extension(service): Extension<Arc<Service>>,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), Problem> {
    let created = service.register_user(req.into()).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn get_user(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserDto>, Problem> {
    Ok(Json(service.get_user(id).await?.into()))
}

pub async fn request_otp(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<OtpIssuedResponse>), Problem> {
    let expires_at = service.request_otp(id).await?;
    Ok((StatusCode::ACCEPTED, Json(OtpIssuedResponse { expires_at })))
}

pub async fn verify_otp(
    Extension(service): Extension<Arc<Service>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<StatusCode, Problem> {
    service.verify_otp(id, &req.code).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
