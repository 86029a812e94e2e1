//! Mapper implementations for converting between DTOs and contract models

use super::dto::*;
use crate::contract::{self, ComplianceError, PartyType, ReportStatus};
use crate::domain::validation::MatchInput;

impl From<contract::Document> for DocumentDto {
    fn from(d: contract::Document) -> Self {
        Self {
            id: d.id,
            name: d.name,
            document_type: d.document_type,
            file_type: d.file_type.as_str().to_string(),
            size_bytes: d.size_bytes,
            created_by: d.created_by,
            updated_by: d.updated_by,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<contract::WatchlistReport> for ReportDto {
    fn from(r: contract::WatchlistReport) -> Self {
        Self {
            id: r.id,
            document_id: r.document_id,
            status: r.status.as_str().to_string(),
            status_detail: r.status_detail,
            row_count: r.row_count,
            updated_by: r.updated_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<contract::WatchlistEntry> for EntryDto {
    fn from(e: contract::WatchlistEntry) -> Self {
        Self {
            id: e.id,
            document_id: e.document_id,
            row_number: e.row_number,
            code: e.code,
            party_kind: e.party_kind.as_str().to_string(),
            full_name: e.full_name,
            first_name: e.first_name,
            last_name: e.last_name,
            aliases: e.aliases,
            description: e.description,
            description_segments: e.description_segments,
            national_id: e.national_id,
            passport_number: e.passport_number,
            birth_place: e.birth_place,
            birth_date: e.birth_date,
            nationality: e.nationality,
            address: e.address,
            address_fragments: e.address_fragments,
            created_at: e.created_at,
        }
    }
}

impl From<contract::MatchRecord> for MatchDto {
    fn from(m: contract::MatchRecord) -> Self {
        Self {
            id: m.id,
            report_id: m.report_id,
            party_type: m.party_type.as_str().to_string(),
            external_party_id: m.external_party_id,
            watchlist_entry_id: m.watchlist_entry_id,
            matched_code: m.matched_code,
            similarity_score: m.similarity_score,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<MatchRequest> for MatchInput {
    fn from(req: MatchRequest) -> Self {
        Self {
            external_party_id: req.external_party_id,
            matched_code: req.matched_code,
            similarity_score: req.similarity_score,
            watchlist_entry_id: req.watchlist_entry_id,
        }
    }
}

impl From<contract::PartySnapshot> for SnapshotDto {
    fn from(s: contract::PartySnapshot) -> Self {
        Self {
            id: s.id,
            party_type: s.party_type.as_str().to_string(),
            external_party_id: s.external_party_id,
            name: s.name,
            national_id: s.national_id,
            passport_number: s.passport_number,
            birth_date: s.birth_date,
            nationality: s.nationality,
            email: s.email,
            synced_at: s.synced_at,
        }
    }
}

impl From<RegisterUserRequest> for contract::NewUser {
    fn from(req: RegisterUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            phone: req.phone,
        }
    }
}

impl From<(contract::User, contract::UserProfile)> for UserDto {
    fn from((user, profile): (contract::User, contract::UserProfile)) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
            profile: ProfileDto {
                full_name: profile.full_name,
                phone: profile.phone,
                email_verified: profile.email_verified,
                updated_at: profile.updated_at,
            },
        }
    }
}

/// Parse a party type from a path or body value
pub fn parse_party_type(raw: &str) -> Result<PartyType, ComplianceError> {
    PartyType::parse(&raw.to_ascii_lowercase()).ok_or_else(|| {
        ComplianceError::invalid_field(
            "party_type",
            format!("'{}' is not one of personal, corporate, publisher", raw),
        )
    })
}

pub fn parse_report_status(raw: &str) -> Result<ReportStatus, ComplianceError> {
    ReportStatus::parse(&raw.to_ascii_lowercase()).ok_or_else(|| {
        ComplianceError::invalid_field(
            "status",
            format!(
                "'{}' is not one of pending, processing, dispatched, failed",
                raw
            ),
        )
    })
}
