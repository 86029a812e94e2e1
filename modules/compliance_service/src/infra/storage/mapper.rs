//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models. Enum columns are
//! stored as their lowercase names; string lists as JSON arrays.

use super::entity::{
    document, match_record, otp_code, party_snapshot, user, user_profile, watchlist_entry,
    watchlist_report,
};
use crate::contract::{
    Document, FileType, MatchRecord, OtpCode, PartyKind, PartySnapshot, PartyType, ReportStatus,
    User, UserProfile, WatchlistEntry, WatchlistReport,
};
use anyhow::anyhow;
use sea_orm::ActiveValue::Set;

fn party_type(raw: &str) -> anyhow::Result<PartyType> {
    PartyType::parse(raw).ok_or_else(|| anyhow!("unknown party type in database: {}", raw))
}

fn string_list(value: serde_json::Value) -> anyhow::Result<Vec<String>> {
    Ok(serde_json::from_value(value)?)
}

fn json_list(items: &[String]) -> serde_json::Value {
    serde_json::Value::from(items.to_vec())
}

// ===== Documents =====

impl TryFrom<document::Model> for Document {
    type Error = anyhow::Error;

    fn try_from(m: document::Model) -> Result<Self, Self::Error> {
        let file_type = FileType::parse(&m.file_type)
            .ok_or_else(|| anyhow!("unknown file type in database: {}", m.file_type))?;
        Ok(Self {
            id: m.id,
            name: m.name,
            document_type: m.document_type,
            file_type,
            storage_key: m.storage_key,
            size_bytes: m.size_bytes,
            created_by: m.created_by,
            updated_by: m.updated_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<&Document> for document::ActiveModel {
    fn from(d: &Document) -> Self {
        Self {
            id: Set(d.id),
            name: Set(d.name.clone()),
            document_type: Set(d.document_type.clone()),
            file_type: Set(d.file_type.as_str().to_string()),
            storage_key: Set(d.storage_key.clone()),
            size_bytes: Set(d.size_bytes),
            created_by: Set(d.created_by),
            updated_by: Set(d.updated_by),
            created_at: Set(d.created_at),
            updated_at: Set(d.updated_at),
        }
    }
}

// ===== Reports =====

impl TryFrom<watchlist_report::Model> for WatchlistReport {
    type Error = anyhow::Error;

    fn try_from(m: watchlist_report::Model) -> Result<Self, Self::Error> {
        let status = ReportStatus::parse(&m.status)
            .ok_or_else(|| anyhow!("unknown report status in database: {}", m.status))?;
        Ok(Self {
            id: m.id,
            document_id: m.document_id,
            status,
            status_detail: m.status_detail,
            row_count: m.row_count,
            updated_by: m.updated_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<&WatchlistReport> for watchlist_report::ActiveModel {
    fn from(r: &WatchlistReport) -> Self {
        Self {
            id: Set(r.id),
            document_id: Set(r.document_id),
            status: Set(r.status.as_str().to_string()),
            status_detail: Set(r.status_detail.clone()),
            row_count: Set(r.row_count),
            updated_by: Set(r.updated_by),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        }
    }
}

// ===== Entries =====

impl TryFrom<watchlist_entry::Model> for WatchlistEntry {
    type Error = anyhow::Error;

    fn try_from(m: watchlist_entry::Model) -> Result<Self, Self::Error> {
        let party_kind = PartyKind::parse(&m.party_kind)
            .ok_or_else(|| anyhow!("unknown party kind in database: {}", m.party_kind))?;
        Ok(Self {
            id: m.id,
            document_id: m.document_id,
            uploaded_by: m.uploaded_by,
            row_number: m.row_number,
            code: m.code,
            party_kind,
            full_name: m.full_name,
            first_name: m.first_name,
            last_name: m.last_name,
            aliases: string_list(m.aliases)?,
            description: m.description,
            description_segments: string_list(m.description_segments)?,
            national_id: m.national_id,
            passport_number: m.passport_number,
            birth_place: m.birth_place,
            birth_date: m.birth_date,
            nationality: m.nationality,
            address: m.address,
            address_fragments: string_list(m.address_fragments)?,
            created_at: m.created_at,
        })
    }
}

impl From<&WatchlistEntry> for watchlist_entry::ActiveModel {
    fn from(e: &WatchlistEntry) -> Self {
        Self {
            id: Set(e.id),
            document_id: Set(e.document_id),
            uploaded_by: Set(e.uploaded_by),
            row_number: Set(e.row_number),
            code: Set(e.code.clone()),
            party_kind: Set(e.party_kind.as_str().to_string()),
            full_name: Set(e.full_name.clone()),
            first_name: Set(e.first_name.clone()),
            last_name: Set(e.last_name.clone()),
            aliases: Set(json_list(&e.aliases)),
            description: Set(e.description.clone()),
            description_segments: Set(json_list(&e.description_segments)),
            national_id: Set(e.national_id.clone()),
            passport_number: Set(e.passport_number.clone()),
            birth_place: Set(e.birth_place.clone()),
            birth_date: Set(e.birth_date.clone()),
            nationality: Set(e.nationality.clone()),
            address: Set(e.address.clone()),
            address_fragments: Set(json_list(&e.address_fragments)),
            created_at: Set(e.created_at),
        }
    }
}

// ===== Match records =====

impl TryFrom<match_record::Model> for MatchRecord {
    type Error = anyhow::Error;

    fn try_from(m: match_record::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            report_id: m.report_id,
            party_type: party_type(&m.party_type)?,
            external_party_id: m.external_party_id,
            watchlist_entry_id: m.watchlist_entry_id,
            matched_code: m.matched_code,
            similarity_score: m.similarity_score,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<&MatchRecord> for match_record::ActiveModel {
    fn from(r: &MatchRecord) -> Self {
        Self {
            id: Set(r.id),
            report_id: Set(r.report_id),
            party_type: Set(r.party_type.as_str().to_string()),
            external_party_id: Set(r.external_party_id.clone()),
            watchlist_entry_id: Set(r.watchlist_entry_id),
            matched_code: Set(r.matched_code.clone()),
            similarity_score: Set(r.similarity_score),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        }
    }
}

// ===== Snapshots =====

impl TryFrom<party_snapshot::Model> for PartySnapshot {
    type Error = anyhow::Error;

    fn try_from(m: party_snapshot::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            party_type: party_type(&m.party_type)?,
            external_party_id: m.external_party_id,
            name: m.name,
            national_id: m.national_id,
            passport_number: m.passport_number,
            birth_date: m.birth_date,
            nationality: m.nationality,
            email: m.email,
            synced_at: m.synced_at,
        })
    }
}

impl From<&PartySnapshot> for party_snapshot::ActiveModel {
    fn from(s: &PartySnapshot) -> Self {
        Self {
            id: Set(s.id),
            party_type: Set(s.party_type.as_str().to_string()),
            external_party_id: Set(s.external_party_id.clone()),
            name: Set(s.name.clone()),
            national_id: Set(s.national_id.clone()),
            passport_number: Set(s.passport_number.clone()),
            birth_date: Set(s.birth_date.clone()),
            nationality: Set(s.nationality.clone()),
            email: Set(s.email.clone()),
            synced_at: Set(s.synced_at),
        }
    }
}

// ===== Users =====

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            password_hash: m.password_hash,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

impl From<&User> for user::ActiveModel {
    fn from(u: &User) -> Self {
        Self {
            id: Set(u.id),
            username: Set(u.username.clone()),
            email: Set(u.email.clone()),
            password_hash: Set(u.password_hash.clone()),
            is_active: Set(u.is_active),
            created_at: Set(u.created_at),
        }
    }
}

impl From<user_profile::Model> for UserProfile {
    fn from(m: user_profile::Model) -> Self {
        Self {
            user_id: m.user_id,
            full_name: m.full_name,
            phone: m.phone,
            email_verified: m.email_verified,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&UserProfile> for user_profile::ActiveModel {
    fn from(p: &UserProfile) -> Self {
        Self {
            user_id: Set(p.user_id),
            full_name: Set(p.full_name.clone()),
            phone: Set(p.phone.clone()),
            email_verified: Set(p.email_verified),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        }
    }
}

impl From<otp_code::Model> for OtpCode {
    fn from(m: otp_code::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            code_hash: m.code_hash,
            expires_at: m.expires_at,
            consumed_at: m.consumed_at,
            created_at: m.created_at,
        }
    }
}

impl From<&OtpCode> for otp_code::ActiveModel {
    fn from(o: &OtpCode) -> Self {
        Self {
            id: Set(o.id),
            user_id: Set(o.user_id),
            code_hash: Set(o.code_hash.clone()),
            expires_at: Set(o.expires_at),
            consumed_at: Set(o.consumed_at),
            created_at: Set(o.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_unknown_enum_value_is_an_error() {
        let model = match_record::Model {
            id: Uuid::new_v4(),
            report_id: Uuid::new_v4(),
            party_type: "government".into(),
            external_party_id: "42".into(),
            watchlist_entry_id: None,
            matched_code: "ID-1".into(),
            similarity_score: 0.9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(MatchRecord::try_from(model).is_err());
    }

    #[test]
    fn test_entry_lists_survive_json_columns() {
        let model = watchlist_entry::Model {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            uploaded_by: None,
            row_number: 1,
            code: "ID-1".into(),
            party_kind: "person".into(),
            full_name: "Abu Bakar".into(),
            first_name: "Abu".into(),
            last_name: "Bakar".into(),
            aliases: serde_json::json!(["Abu B", "Bakar"]),
            description: String::new(),
            description_segments: serde_json::json!([]),
            national_id: None,
            passport_number: None,
            birth_place: None,
            birth_date: None,
            nationality: None,
            address: None,
            address_fragments: serde_json::json!(["Jakarta"]),
            created_at: Utc::now(),
        };
        let entry = WatchlistEntry::try_from(model).unwrap();
        assert_eq!(entry.aliases, vec!["Abu B", "Bakar"]);
        assert_eq!(entry.address_fragments, vec!["Jakarta"]);
    }
}
