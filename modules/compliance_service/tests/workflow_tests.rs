//! DTTOT workflow, job handling and snapshot sync against in-memory stores

mod common;

use bytes::Bytes;
use common::{Harness, StaticPartySource, DTTOT_CSV};
use compliance_service::contract::*;
use compliance_service::domain::workflow::generated_code;
use compliance_service::domain::{
    ComplianceJobHandler, Job, JobHandler, Matcher, NewDocument, SnapshotSync, WatchlistWorkflow,
};
use compliance_service::infra::queue::{self, WorkerPool, WorkerSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const THRESHOLD: f64 = 0.85;

async fn upload(h: &Harness, body: &str) -> Document {
    h.service
        .create_document(
            NewDocument {
                name: None,
                document_type: DTTOT_DOCUMENT_TYPE.to_string(),
                file_name: "dttot.csv".to_string(),
                bytes: Bytes::from(body.to_string()),
            },
            Some(Uuid::new_v4()),
        )
        .await
        .unwrap()
}

fn seed_parties(h: &Harness) {
    h.store.seed_snapshot(PartyType::Personal, "u-1", "Abu Bakar");
    h.store.seed_snapshot(PartyType::Personal, "u-2", "Siti Rahmawati");
    h.store.seed_snapshot(PartyType::Corporate, "o-1", "Jamaah Islamiyah");
    h.store.seed_snapshot(PartyType::Publisher, "o-2", "Majalah Tempo");
}

#[tokio::test]
async fn test_process_document_normalizes_and_dispatches_rows() {
    let h = Harness::new();
    let document = upload(&h, DTTOT_CSV).await;
    let workflow = h.workflow(THRESHOLD);

    let report = workflow
        .process_document(document.id, document.created_by)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.status, ReportStatus::Dispatched);
    assert_eq!(report.row_count, 2);
    assert_eq!(report.document_id, document.id);

    let entries = h.service.list_entries(report.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].code, "ID-001");
    assert_eq!(entries[0].party_kind, PartyKind::Person);
    assert_eq!(entries[0].national_id.as_deref(), Some("3201012345678901"));
    assert_eq!(entries[0].uploaded_by, document.created_by);
    assert_eq!(entries[1].code, generated_code(document.id, 2));
    assert_eq!(entries[1].party_kind, PartyKind::Organization);

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 2);
    for (job, entry) in jobs.iter().zip(&entries) {
        assert_eq!(
            job,
            &Job::PersistRowMatches {
                report_id: report.id,
                entry_id: entry.id,
            }
        );
    }
}

#[tokio::test]
async fn test_unreadable_file_marks_report_failed() {
    let h = Harness::new();
    let document = upload(&h, "foo,bar\n1,2\n").await;

    let report = h
        .workflow(THRESHOLD)
        .process_document(document.id, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.status, ReportStatus::Failed);
    assert!(report.status_detail.contains("name"));
    assert!(h.queue.jobs().is_empty());
    assert_eq!(h.store.entry_count(), 0);
}

#[tokio::test]
async fn test_missing_document_is_skipped() {
    let h = Harness::new();
    let outcome = h
        .workflow(THRESHOLD)
        .process_document(Uuid::new_v4(), None)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(h.store.reports.read().is_empty());
}

#[tokio::test]
async fn test_row_matches_are_scored_per_party_type_and_idempotent() {
    let h = Harness::new();
    seed_parties(&h);
    let document = upload(&h, DTTOT_CSV).await;
    let workflow = h.workflow(THRESHOLD);
    let report = workflow
        .process_document(document.id, None)
        .await
        .unwrap()
        .unwrap();

    let mut written = 0;
    for job in h.queue.jobs() {
        let Job::PersistRowMatches {
            report_id,
            entry_id,
        } = job
        else {
            panic!("unexpected job {:?}", job);
        };
        written += workflow.persist_row_matches(report_id, entry_id).await.unwrap();
    }
    assert_eq!(written, 2);

    let personal = h
        .service
        .list_matches(report.id, PartyType::Personal)
        .await
        .unwrap();
    assert_eq!(personal.len(), 1);
    assert_eq!(personal[0].external_party_id, "u-1");
    assert_eq!(personal[0].matched_code, "ID-001");
    assert!((0.0..=1.0).contains(&personal[0].similarity_score));

    let corporate = h
        .service
        .list_matches(report.id, PartyType::Corporate)
        .await
        .unwrap();
    assert_eq!(corporate.len(), 1);
    assert_eq!(corporate[0].external_party_id, "o-1");
    assert!(h
        .service
        .list_matches(report.id, PartyType::Publisher)
        .await
        .unwrap()
        .is_empty());

    // at-least-once delivery: replaying every row job changes nothing
    for job in h.queue.jobs() {
        if let Job::PersistRowMatches {
            report_id,
            entry_id,
        } = job
        {
            workflow.persist_row_matches(report_id, entry_id).await.unwrap();
        }
    }
    assert_eq!(h.store.match_count(), 2);
}

#[tokio::test]
async fn test_reprocessing_replaces_entries() {
    let h = Harness::new();
    seed_parties(&h);
    let document = upload(&h, DTTOT_CSV).await;
    let workflow = h.workflow(THRESHOLD);

    let first = workflow
        .process_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    for job in h.queue.take() {
        if let Job::PersistRowMatches {
            report_id,
            entry_id,
        } = job
        {
            workflow.persist_row_matches(report_id, entry_id).await.unwrap();
        }
    }
    let old_entry_ids: Vec<Uuid> = h.store.entries.read().keys().copied().collect();

    let second = workflow
        .process_document(document.id, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(h.store.entry_count(), 2);
    assert!(h
        .store
        .entries
        .read()
        .keys()
        .all(|id| !old_entry_ids.contains(id)));
    // matches survive with their entry link cleared
    assert_eq!(h.store.match_count(), 2);
    assert!(h
        .store
        .matches
        .read()
        .values()
        .all(|m| m.watchlist_entry_id.is_none()));

    // a row job queued before reprocessing finds no entry and writes nothing
    let stale = workflow
        .persist_row_matches(first.id, old_entry_ids[0])
        .await
        .unwrap();
    assert_eq!(stale, 0);
}

#[tokio::test]
async fn test_threshold_controls_candidates() {
    let h = Harness::new();
    h.store
        .seed_snapshot(PartyType::Personal, "u-9", "Abubakar Basyir");
    let document = upload(&h, DTTOT_CSV).await;

    let strict = WatchlistWorkflow::new(
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.files.clone(),
        h.queue.clone(),
        Matcher::with_threshold(1.0),
    );
    let report = strict
        .process_document(document.id, None)
        .await
        .unwrap()
        .unwrap();
    let entries = h.service.list_entries(report.id).await.unwrap();

    let written = strict
        .persist_row_matches(report.id, entries[0].id)
        .await
        .unwrap();
    assert_eq!(written, 0);

    let lenient = h.workflow(0.0);
    let written = lenient
        .persist_row_matches(report.id, entries[0].id)
        .await
        .unwrap();
    assert_eq!(written, 1);
}

// ===== Job handler and snapshot sync =====

fn job_handler(h: &Harness, source: StaticPartySource) -> ComplianceJobHandler {
    let sync = SnapshotSync::new(Arc::new(source), h.store.clone());
    ComplianceJobHandler::new(Arc::new(h.workflow(THRESHOLD)), Arc::new(sync))
}

fn parties() -> StaticPartySource {
    StaticPartySource::default()
        .with(PartyType::Personal, "1", "Budi Santoso")
        .with(PartyType::Corporate, "10", "PT Maju Jaya")
        .with(PartyType::Publisher, "20", "Penerbit Nusantara")
}

#[tokio::test]
async fn test_snapshot_sync_job_upserts_without_duplicates() {
    let h = Harness::new();
    let handler = job_handler(&h, parties());

    let job = Job::SyncExternalSnapshots {
        party_type: None,
        ids: None,
    };
    handler.handle(&job).await.unwrap();
    handler.handle(&job).await.unwrap();

    let all = h.service.list_snapshots(None).await.unwrap();
    assert_eq!(all.len(), 3);

    handler
        .handle(&Job::SyncExternalSnapshots {
            party_type: Some(PartyType::Corporate),
            ids: None,
        })
        .await
        .unwrap();
    assert_eq!(h.service.list_snapshots(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_sync_ids_aborts_on_missing_party() {
    let h = Harness::new();
    let sync = SnapshotSync::new(Arc::new(parties()), h.store.clone());

    let err = sync
        .sync_ids(PartyType::Personal, &["1".to_string(), "404".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ComplianceError::NotFound { .. }));
    assert!(h.store.snapshots.read().is_empty());

    let written = sync
        .sync_ids(PartyType::Personal, &["1".to_string()])
        .await
        .unwrap();
    assert_eq!(written, 1);
}

#[tokio::test]
async fn test_worker_pool_runs_the_whole_pipeline() {
    let h = Harness::new();
    seed_parties(&h);
    let document = upload(&h, DTTOT_CSV).await;

    let (queue, receiver) = queue::channel();
    let queue = Arc::new(queue);
    let workflow = Arc::new(WatchlistWorkflow::new(
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.files.clone(),
        queue.clone(),
        Matcher::with_threshold(THRESHOLD),
    ));
    let sync = Arc::new(SnapshotSync::new(
        Arc::new(StaticPartySource::default()),
        h.store.clone(),
    ));
    let handler = Arc::new(ComplianceJobHandler::new(workflow, sync));

    let cancel = CancellationToken::new();
    let workers = WorkerPool::new(
        handler,
        WorkerSettings {
            workers: 2,
            max_attempts: 2,
            retry_delay: Duration::from_millis(10),
        },
    )
    .spawn(receiver, cancel.clone());

    use compliance_service::domain::JobQueue;
    queue
        .enqueue(Job::ProcessWatchlistDocument {
            document_id: document.id,
            requested_by: None,
        })
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        let dispatched = || {
            h.store
                .reports
                .read()
                .values()
                .any(|r| r.status == ReportStatus::Dispatched)
        };
        while h.store.match_count() < 2 || !dispatched() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("row jobs did not complete");

    let report = h.service.get_report_for_document(document.id).await.unwrap();
    assert_eq!(report.status, ReportStatus::Dispatched);

    cancel.cancel();
    for worker in workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn test_missing_stored_file_fails_report_after_retries() {
    let h = Harness::new();
    let document = upload(&h, DTTOT_CSV).await;
    h.files.files.write().clear();

    let (queue, receiver) = queue::channel();
    let queue = Arc::new(queue);
    let workflow = Arc::new(WatchlistWorkflow::new(
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.files.clone(),
        queue.clone(),
        Matcher::with_threshold(THRESHOLD),
    ));

    // each attempt errors and leaves the report in processing
    let err = workflow.process_document(document.id, None).await.unwrap_err();
    assert!(err.to_string().contains("no file under"));
    let report = h.service.get_report_for_document(document.id).await.unwrap();
    assert_eq!(report.status, ReportStatus::Processing);

    let sync = Arc::new(SnapshotSync::new(
        Arc::new(StaticPartySource::default()),
        h.store.clone(),
    ));
    let handler = Arc::new(ComplianceJobHandler::new(workflow, sync));
    let cancel = CancellationToken::new();
    let workers = WorkerPool::new(
        handler,
        WorkerSettings {
            workers: 1,
            max_attempts: 2,
            retry_delay: Duration::from_millis(5),
        },
    )
    .spawn(receiver, cancel.clone());

    use compliance_service::domain::JobQueue;
    queue
        .enqueue(Job::ProcessWatchlistDocument {
            document_id: document.id,
            requested_by: None,
        })
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let failed = h
                .store
                .reports
                .read()
                .values()
                .any(|r| r.status == ReportStatus::Failed);
            if failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("report was not marked failed");

    let report = h.service.get_report_for_document(document.id).await.unwrap();
    assert_eq!(report.status, ReportStatus::Failed);
    assert!(report.status_detail.contains("no file under"));
    assert!(h.store.entries.read().is_empty());

    cancel.cancel();
    for worker in workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn test_exhausted_job_keeps_finished_report() {
    let h = Harness::new();
    let document = upload(&h, DTTOT_CSV).await;
    let handler = job_handler(&h, parties());
    let job = Job::ProcessWatchlistDocument {
        document_id: document.id,
        requested_by: None,
    };
    handler.handle(&job).await.unwrap();

    handler
        .on_exhausted(&job, &anyhow::anyhow!("late failure"))
        .await;

    let report = h.service.get_report_for_document(document.id).await.unwrap();
    assert_eq!(report.status, ReportStatus::Dispatched);
}

#[tokio::test]
async fn test_targeted_sync_job_writes_only_complete_batches() {
    let h = Harness::new();
    let handler = job_handler(&h, parties());

    // a missing id aborts the batch without a retry
    handler
        .handle(&Job::SyncExternalSnapshots {
            party_type: Some(PartyType::Personal),
            ids: Some(vec!["1".to_string(), "404".to_string()]),
        })
        .await
        .unwrap();
    assert!(h.store.snapshots.read().is_empty());

    handler
        .handle(&Job::SyncExternalSnapshots {
            party_type: Some(PartyType::Personal),
            ids: Some(vec!["1".to_string()]),
        })
        .await
        .unwrap();
    let synced = h.service.list_snapshots(None).await.unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0].external_party_id, "1");
}

#[tokio::test]
async fn test_row_jobs_share_snapshot_lists_per_report() {
    use std::sync::atomic::Ordering;

    let h = Harness::new();
    seed_parties(&h);
    let document = upload(&h, DTTOT_CSV).await;
    let workflow = h.workflow(THRESHOLD);
    workflow.process_document(document.id, None).await.unwrap();

    let jobs = h.queue.take();
    for _ in 0..2 {
        for job in &jobs {
            if let Job::PersistRowMatches {
                report_id,
                entry_id,
            } = job
            {
                workflow.persist_row_matches(*report_id, *entry_id).await.unwrap();
            }
        }
    }
    // one person row (personal) and one organization row (corporate, publisher)
    assert_eq!(h.store.snapshot_lists.load(Ordering::SeqCst), 3);

    // a new run reloads, so freshly synced parties are seen
    h.store.seed_snapshot(PartyType::Personal, "u-3", "Abu Bakar Ba'asyir");
    workflow.process_document(document.id, None).await.unwrap();
    for job in h.queue.take() {
        if let Job::PersistRowMatches {
            report_id,
            entry_id,
        } = job
        {
            workflow.persist_row_matches(report_id, entry_id).await.unwrap();
        }
    }
    assert_eq!(h.store.snapshot_lists.load(Ordering::SeqCst), 6);
}
