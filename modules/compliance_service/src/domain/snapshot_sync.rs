//! External snapshot sync
//!
//! Pulls full party snapshots from the external read-only database and
//! upserts them locally, keyed by `(party_type, external_party_id)`.

use super::repository::SnapshotRepository;
use crate::contract::{ComplianceError, PartySnapshot, PartyType};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Party row as read from the external database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalParty {
    pub external_party_id: String,
    pub name: String,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub email: Option<String>,
}

/// Read-only access to the external party data
#[async_trait]
pub trait ExternalPartySource: Send + Sync {
    /// Every party of the given type
    async fn fetch_all(&self, party_type: PartyType) -> anyhow::Result<Vec<ExternalParty>>;

    /// Parties with the given external ids; unknown ids are simply absent
    async fn fetch_by_ids(
        &self,
        party_type: PartyType,
        ids: &[String],
    ) -> anyhow::Result<Vec<ExternalParty>>;
}

pub struct SnapshotSync {
    source: Arc<dyn ExternalPartySource>,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl SnapshotSync {
    pub fn new(source: Arc<dyn ExternalPartySource>, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { source, snapshots }
    }

    /// Sync every party type in turn; the first failure aborts the batch
    pub async fn sync_all(&self) -> Result<usize, ComplianceError> {
        let mut total = 0;
        for party_type in PartyType::ALL {
            total += self.sync_party_type(party_type).await?;
        }
        Ok(total)
    }

    /// Full snapshot of one party type
    pub async fn sync_party_type(&self, party_type: PartyType) -> Result<usize, ComplianceError> {
        let parties = self
            .source
            .fetch_all(party_type)
            .await
            .map_err(ComplianceError::internal)?;
        self.write(party_type, parties).await
    }

    /// Sync explicit external ids. A missing id aborts the batch before any write.
    pub async fn sync_ids(
        &self,
        party_type: PartyType,
        ids: &[String],
    ) -> Result<usize, ComplianceError> {
        let parties = self
            .source
            .fetch_by_ids(party_type, ids)
            .await
            .map_err(ComplianceError::internal)?;

        let found: HashSet<&str> = parties
            .iter()
            .map(|p| p.external_party_id.as_str())
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(id.as_str())) {
            tracing::error!(party_type = %party_type, id = %missing, "external party missing, aborting sync");
            return Err(ComplianceError::not_found(
                &format!("external {} party", party_type),
                missing,
            ));
        }

        self.write(party_type, parties).await
    }

    async fn write(
        &self,
        party_type: PartyType,
        parties: Vec<ExternalParty>,
    ) -> Result<usize, ComplianceError> {
        let synced_at = Utc::now();
        let snapshots: Vec<PartySnapshot> = parties
            .into_iter()
            .map(|p| PartySnapshot {
                id: Uuid::new_v4(),
                party_type,
                external_party_id: p.external_party_id,
                name: p.name,
                national_id: p.national_id,
                passport_number: p.passport_number,
                birth_date: p.birth_date,
                nationality: p.nationality,
                email: p.email,
                synced_at,
            })
            .collect();

        let written = self
            .snapshots
            .upsert_many(&snapshots)
            .await
            .map_err(ComplianceError::internal)?;
        tracing::info!(party_type = %party_type, written, "external snapshots synced");
        Ok(written)
    }
}
