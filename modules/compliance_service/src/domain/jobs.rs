//! Background job definitions
//!
//! Jobs are executed by the worker pool in `infra::queue` with at-least-once
//! semantics, so every handler must tolerate being run twice.

use crate::contract::{ComplianceError, PartyType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unit of background work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    /// Run the DTTOT ETL workflow for one document
    ProcessWatchlistDocument {
        document_id: Uuid,
        requested_by: Option<Uuid>,
    },
    /// Score one watchlist row against external snapshots
    PersistRowMatches { report_id: Uuid, entry_id: Uuid },
    /// Pull snapshots from the external database (all types when `None`),
    /// or only the listed external ids of `party_type`
    SyncExternalSnapshots {
        #[serde(default, with = "party_type_opt")]
        party_type: Option<PartyType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ids: Option<Vec<String>>,
    },
}

impl Job {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Job::ProcessWatchlistDocument { .. } => "process_watchlist_document",
            Job::PersistRowMatches { .. } => "persist_row_matches",
            Job::SyncExternalSnapshots { .. } => "sync_external_snapshots",
        }
    }
}

/// Accepts jobs for asynchronous execution
#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> anyhow::Result<()>;
}

/// Executes a job pulled from the queue
#[async_trait::async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> anyhow::Result<()>;

    /// Called once after the last attempt of `job` failed with `error`
    async fn on_exhausted(&self, _job: &Job, _error: &anyhow::Error) {}
}

/// Routes jobs to the workflow and the snapshot sync
pub struct ComplianceJobHandler {
    workflow: Arc<super::workflow::WatchlistWorkflow>,
    snapshot_sync: Arc<super::snapshot_sync::SnapshotSync>,
}

impl ComplianceJobHandler {
    pub fn new(
        workflow: Arc<super::workflow::WatchlistWorkflow>,
        snapshot_sync: Arc<super::snapshot_sync::SnapshotSync>,
    ) -> Self {
        Self {
            workflow,
            snapshot_sync,
        }
    }
}

#[async_trait::async_trait]
impl JobHandler for ComplianceJobHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<()> {
        match job {
            Job::ProcessWatchlistDocument {
                document_id,
                requested_by,
            } => {
                self.workflow
                    .process_document(*document_id, *requested_by)
                    .await?;
            }
            Job::PersistRowMatches {
                report_id,
                entry_id,
            } => {
                self.workflow.persist_row_matches(*report_id, *entry_id).await?;
            }
            Job::SyncExternalSnapshots { party_type, ids } => match (party_type, ids) {
                (Some(party_type), Some(ids)) => {
                    match self.snapshot_sync.sync_ids(*party_type, ids).await {
                        // the batch is aborted and rerunning cannot find the id
                        Err(ComplianceError::NotFound { resource, id }) => {
                            tracing::error!(%resource, %id, "targeted snapshot sync aborted");
                        }
                        other => {
                            other?;
                        }
                    }
                }
                (Some(party_type), None) => {
                    self.snapshot_sync.sync_party_type(*party_type).await?;
                }
                (None, Some(_)) => {
                    anyhow::bail!("targeted snapshot sync needs a party type");
                }
                (None, None) => {
                    self.snapshot_sync.sync_all().await?;
                }
            },
        }
        Ok(())
    }

    async fn on_exhausted(&self, job: &Job, error: &anyhow::Error) {
        if let Job::ProcessWatchlistDocument { document_id, .. } = job {
            if let Err(e) = self.workflow.mark_failed(*document_id, error).await {
                tracing::error!(document_id = %document_id, error = %e, "could not record failed report");
            }
        }
    }
}

mod party_type_opt {
    use crate::contract::PartyType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<PartyType>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(p) => s.serialize_some(p.as_str()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PartyType>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| {
            PartyType::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown party type '{}'", s)))
        })
        .transpose()
    }
}
