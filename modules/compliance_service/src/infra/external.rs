//! Read-only access to the platform's external party database
//!
//! Fixed, parameterized raw SQL over a second connection. Personal parties are
//! platform users; corporate and publisher parties are organizations told apart
//! by `org_type`.

use crate::contract::PartyType;
use crate::domain::snapshot_sync::{ExternalParty, ExternalPartySource};
use anyhow::Result;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, FromQueryResult, Statement, Value,
};
use std::sync::Arc;

const PERSONAL_SQL: &str = "SELECT CAST(u.id AS TEXT) AS external_party_id, \
     u.full_name AS name, u.nik AS national_id, u.passport_number, \
     CAST(u.birth_date AS TEXT) AS birth_date, u.nationality, u.email \
     FROM users u WHERE u.is_active = TRUE";

const ORGANIZATION_SQL: &str = "SELECT CAST(o.id AS TEXT) AS external_party_id, \
     o.legal_name AS name, o.registration_number AS national_id, \
     CAST(NULL AS TEXT) AS passport_number, \
     CAST(o.established_on AS TEXT) AS birth_date, o.country AS nationality, o.email \
     FROM organizations o WHERE o.org_type = $1";

#[derive(Debug, FromQueryResult)]
struct ExternalPartyRow {
    external_party_id: String,
    name: String,
    national_id: Option<String>,
    passport_number: Option<String>,
    birth_date: Option<String>,
    nationality: Option<String>,
    email: Option<String>,
}

impl From<ExternalPartyRow> for ExternalParty {
    fn from(row: ExternalPartyRow) -> Self {
        Self {
            external_party_id: row.external_party_id,
            name: row.name,
            national_id: row.national_id,
            passport_number: row.passport_number,
            // drop the time part some backends render for dates
            birth_date: row.birth_date.map(|d| d.chars().take(10).collect()),
            nationality: row.nationality,
            email: row.email,
        }
    }
}

pub struct SqlExternalPartySource {
    db: Arc<DatabaseConnection>,
}

impl SqlExternalPartySource {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Base query and its bound values for a party type
    fn base(party_type: PartyType) -> (&'static str, Vec<Value>) {
        match party_type {
            PartyType::Personal => (PERSONAL_SQL, Vec::new()),
            PartyType::Corporate => (ORGANIZATION_SQL, vec!["corporate".into()]),
            PartyType::Publisher => (ORGANIZATION_SQL, vec!["publisher".into()]),
        }
    }

    async fn query(&self, sql: String, values: Vec<Value>) -> Result<Vec<ExternalParty>> {
        let backend = self.db.get_database_backend();
        let stmt = Statement::from_sql_and_values(backend, sql, values);
        let rows = ExternalPartyRow::find_by_statement(stmt)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Append `AND <column> IN (...)` with numbered placeholders after `offset`
fn with_id_filter(sql: &str, column: &str, offset: usize, count: usize) -> String {
    let placeholders: Vec<String> = (1..=count).map(|i| format!("${}", offset + i)).collect();
    format!("{} AND CAST({} AS TEXT) IN ({})", sql, column, placeholders.join(", "))
}

#[async_trait::async_trait]
impl ExternalPartySource for SqlExternalPartySource {
    async fn fetch_all(&self, party_type: PartyType) -> Result<Vec<ExternalParty>> {
        let (sql, values) = Self::base(party_type);
        let parties = self.query(sql.to_string(), values).await?;
        tracing::debug!(party_type = %party_type, count = parties.len(), "external parties fetched");
        Ok(parties)
    }

    async fn fetch_by_ids(&self, party_type: PartyType, ids: &[String]) -> Result<Vec<ExternalParty>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, mut values) = Self::base(party_type);
        let column = match party_type {
            PartyType::Personal => "u.id",
            PartyType::Corporate | PartyType::Publisher => "o.id",
        };
        let sql = with_id_filter(sql, column, values.len(), ids.len());
        values.extend(ids.iter().map(|id| Value::from(id.clone())));
        self.query(sql, values).await
    }
}

/// Whether the backend understands the `$n` placeholders used above
pub fn supports_numbered_placeholders(backend: DatabaseBackend) -> bool {
    matches!(backend, DatabaseBackend::Postgres | DatabaseBackend::Sqlite)
}
