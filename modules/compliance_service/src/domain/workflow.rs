//! DTTOT watchlist workflow
//!
//! `process_document` runs the ETL pipeline for one document, persists the
//! resulting entries together with the report in a single transaction and then
//! queues one `PersistRowMatches` job per entry. Row jobs are fire-and-forget.

use super::etl::{self, WatchlistRow};
use super::files::FileStorage;
use super::jobs::{Job, JobQueue};
use super::matching::Matcher;
use super::repository::{DocumentRepository, MatchRepository, SnapshotRepository, WatchlistRepository};
use crate::contract::{
    Document, MatchRecord, PartySnapshot, PartyType, ReportStatus, WatchlistEntry, WatchlistReport,
};
use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Snapshot lists loaded for the report whose rows are being scored
type SnapshotCache = Option<(Uuid, HashMap<PartyType, Arc<Vec<PartySnapshot>>>)>;

pub struct WatchlistWorkflow {
    documents: Arc<dyn DocumentRepository>,
    watchlist: Arc<dyn WatchlistRepository>,
    matches: Arc<dyn MatchRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
    files: Arc<dyn FileStorage>,
    jobs: Arc<dyn JobQueue>,
    matcher: Matcher,
    snapshot_cache: Mutex<SnapshotCache>,
}

impl WatchlistWorkflow {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        watchlist: Arc<dyn WatchlistRepository>,
        matches: Arc<dyn MatchRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
        files: Arc<dyn FileStorage>,
        jobs: Arc<dyn JobQueue>,
        matcher: Matcher,
    ) -> Self {
        Self {
            documents,
            watchlist,
            matches,
            snapshots,
            files,
            jobs,
            matcher,
            snapshot_cache: Mutex::new(None),
        }
    }

    /// Run the ETL workflow for a document.
    ///
    /// Data errors in the file mark the report `failed` and end the job
    /// successfully; infrastructure errors are returned so the queue retries.
    pub async fn process_document(
        &self,
        document_id: Uuid,
        requested_by: Option<Uuid>,
    ) -> Result<Option<WatchlistReport>> {
        let Some(document) = self.documents.find_by_id(document_id).await? else {
            tracing::warn!(document_id = %document_id, "document vanished before processing");
            return Ok(None);
        };

        let mut report = self.start_report(&document, requested_by).await?;

        let bytes = self.files.load(&document.storage_key).await?;
        let file_type = document.file_type;
        let parsed = tokio::task::spawn_blocking(move || etl::run(&bytes, file_type)).await?;

        let rows = match parsed {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(document_id = %document_id, error = %e, "watchlist ETL failed");
                report.status = ReportStatus::Failed;
                report.status_detail = e.to_string();
                report.updated_at = Utc::now();
                let report = self.watchlist.update_report(&report).await?;
                return Ok(Some(report));
            }
        };

        let now = Utc::now();
        let entries: Vec<WatchlistEntry> = rows
            .into_iter()
            .map(|row| to_entry(&document, row, now))
            .collect();

        report.row_count = entries.len() as i32;
        report.status_detail = format!("{} rows normalized", entries.len());
        report.updated_at = now;
        self.watchlist.store_entries(&report, &entries).await?;
        self.forget_snapshots(report.id);

        for entry in &entries {
            self.jobs
                .enqueue(Job::PersistRowMatches {
                    report_id: report.id,
                    entry_id: entry.id,
                })
                .await?;
        }

        report.status = ReportStatus::Dispatched;
        report.status_detail = format!("{} rows dispatched for matching", entries.len());
        report.updated_at = Utc::now();
        let report = self.watchlist.update_report(&report).await?;

        tracing::info!(
            document_id = %document_id,
            report_id = %report.id,
            rows = entries.len(),
            "watchlist document processed"
        );
        Ok(Some(report))
    }

    async fn start_report(
        &self,
        document: &Document,
        requested_by: Option<Uuid>,
    ) -> Result<WatchlistReport> {
        let now = Utc::now();
        let report = match self.watchlist.find_report_by_document(document.id).await? {
            Some(mut existing) => {
                existing.status = ReportStatus::Processing;
                existing.status_detail = "processing".to_string();
                existing.updated_by = requested_by.or(existing.updated_by);
                existing.updated_at = now;
                self.watchlist.update_report(&existing).await?
            }
            None => {
                self.watchlist
                    .create_report(&WatchlistReport {
                        id: Uuid::new_v4(),
                        document_id: document.id,
                        status: ReportStatus::Processing,
                        status_detail: "processing".to_string(),
                        row_count: 0,
                        updated_by: requested_by,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?
            }
        };
        Ok(report)
    }

    /// Record a workflow run that will not be retried again.
    ///
    /// Only a report left in `processing` is touched; a report that already
    /// reached `dispatched` or `failed` keeps its outcome.
    pub async fn mark_failed(&self, document_id: Uuid, error: &anyhow::Error) -> Result<()> {
        let Some(mut report) = self.watchlist.find_report_by_document(document_id).await? else {
            return Ok(());
        };
        if report.status != ReportStatus::Processing {
            return Ok(());
        }
        report.status = ReportStatus::Failed;
        report.status_detail = format!("{:#}", error);
        report.updated_at = Utc::now();
        self.watchlist.update_report(&report).await?;
        tracing::error!(document_id = %document_id, report_id = %report.id, error = %error, "watchlist report failed");
        Ok(())
    }

    /// Score one entry against the snapshots of its candidate party types and
    /// upsert a match record per hit. Returns the number of records written.
    pub async fn persist_row_matches(&self, report_id: Uuid, entry_id: Uuid) -> Result<usize> {
        let Some(entry) = self.watchlist.find_entry(entry_id).await? else {
            // entries are replaced when a document is reprocessed
            tracing::warn!(entry_id = %entry_id, "watchlist entry no longer exists");
            return Ok(0);
        };
        if self.watchlist.find_report(report_id).await?.is_none() {
            tracing::warn!(report_id = %report_id, "watchlist report no longer exists");
            return Ok(0);
        }

        let mut written = 0;
        for party_type in entry.party_kind.candidate_party_types() {
            let snapshots = self.report_snapshots(report_id, *party_type).await?;
            for (snapshot, score) in self.matcher.candidates(&entry, snapshots.as_slice()) {
                let now = Utc::now();
                self.matches
                    .upsert(&MatchRecord {
                        id: Uuid::new_v4(),
                        report_id,
                        party_type: *party_type,
                        external_party_id: snapshot.external_party_id.clone(),
                        watchlist_entry_id: Some(entry.id),
                        matched_code: entry.code.clone(),
                        similarity_score: score,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?;
                written += 1;
            }
        }

        if written > 0 {
            tracing::info!(report_id = %report_id, code = %entry.code, written, "watchlist matches recorded");
        }
        Ok(written)
    }
}

impl WatchlistWorkflow {
    /// Snapshots of `party_type`, loaded once per report run
    async fn report_snapshots(
        &self,
        report_id: Uuid,
        party_type: PartyType,
    ) -> Result<Arc<Vec<PartySnapshot>>> {
        let cached = match &*self.snapshot_cache.lock() {
            Some((cached_report, lists)) if *cached_report == report_id => {
                lists.get(&party_type).cloned()
            }
            _ => None,
        };
        if let Some(list) = cached {
            return Ok(list);
        }

        let list = Arc::new(self.snapshots.list(Some(party_type)).await?);
        let mut cache = self.snapshot_cache.lock();
        match &mut *cache {
            Some((cached_report, lists)) if *cached_report == report_id => {
                lists.insert(party_type, list.clone());
            }
            _ => {
                *cache = Some((report_id, HashMap::from([(party_type, list.clone())])));
            }
        }
        Ok(list)
    }

    /// Drop cached snapshots of a report about to be (re)dispatched
    fn forget_snapshots(&self, report_id: Uuid) {
        let mut cache = self.snapshot_cache.lock();
        if matches!(&*cache, Some((cached_report, _)) if *cached_report == report_id) {
            *cache = None;
        }
    }
}

fn to_entry(document: &Document, row: WatchlistRow, now: chrono::DateTime<Utc>) -> WatchlistEntry {
    let code = row.code.unwrap_or_else(|| generated_code(document.id, row.row_number));
    WatchlistEntry {
        id: Uuid::new_v4(),
        document_id: document.id,
        uploaded_by: document.created_by,
        row_number: row.row_number,
        code,
        party_kind: row.party_kind,
        full_name: row.full_name,
        first_name: row.first_name,
        last_name: row.last_name,
        aliases: row.aliases,
        description: row.description,
        description_segments: row.description_segments,
        national_id: row.national_id,
        passport_number: row.passport_number,
        birth_place: row.birth_place,
        birth_date: row.birth_date,
        nationality: row.nationality,
        address: row.address,
        address_fragments: row.address_fragments,
        created_at: now,
    }
}

/// `DTTOT-<first 8 hex of document id>-<row>`
pub fn generated_code(document_id: Uuid, row_number: i32) -> String {
    let hex = document_id.simple().to_string();
    format!("DTTOT-{}-{}", &hex[..8], row_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code() {
        let id = Uuid::parse_str("1234abcd-0000-0000-0000-000000000000").unwrap();
        assert_eq!(generated_code(id, 7), "DTTOT-1234abcd-7");
    }
}
