//! Module declaration and lifecycle
//!
//! `ComplianceModule::init` wires repositories, the job queue, the event
//! router and the domain service. `serve` starts the background side (job
//! workers, event dispatcher, scheduled snapshot sync) and runs until
//! cancelled; `router` exposes the REST API.

use crate::config::Config;
use crate::contract::ComplianceApi;
use crate::domain::{
    ComplianceJobHandler, EventKind, EventRouter, Job, JobQueue, Matcher, OtpService,
    Repositories, Service, SnapshotSync, WatchlistWorkflow,
};
use crate::infra::events::{spawn_dispatcher, ChannelEventPublisher, DttotDocumentHandler};
use crate::infra::queue::{self, JobReceiver, WorkerPool, WorkerSettings};
use crate::infra::storage::{
    SeaOrmDocumentRepository, SeaOrmMatchRepository, SeaOrmOtpRepository, SeaOrmSnapshotRepository,
    SeaOrmUserRepository, SeaOrmWatchlistRepository,
};
use crate::infra::{email::TracingEmailSender, external, files::LocalFileStorage};
use anyhow::{bail, Result};
use parking_lot::Mutex;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background pieces consumed by the first `start`
struct Runtime {
    jobs: JobReceiver,
    job_handler: Arc<ComplianceJobHandler>,
    events: UnboundedReceiver<crate::domain::DocumentEvent>,
    event_router: EventRouter,
}

/// Compliance service module
pub struct ComplianceModule {
    config: Config,
    service: Arc<Service>,
    jobs: Arc<dyn JobQueue>,
    runtime: Mutex<Option<Runtime>>,
}

impl ComplianceModule {
    /// Build the module on an application database and the read-only external database
    pub fn init(config: Config, db: DatabaseConnection, external_db: DatabaseConnection) -> Result<Self> {
        config.validate()?;
        if !external::supports_numbered_placeholders(external_db.get_database_backend()) {
            bail!("external database backend is not supported; use PostgreSQL or SQLite");
        }

        let db = Arc::new(db);
        let repos = Repositories {
            documents: Arc::new(SeaOrmDocumentRepository::new(db.clone())),
            watchlist: Arc::new(SeaOrmWatchlistRepository::new(db.clone())),
            matches: Arc::new(SeaOrmMatchRepository::new(db.clone())),
            snapshots: Arc::new(SeaOrmSnapshotRepository::new(db.clone())),
            users: Arc::new(SeaOrmUserRepository::new(db.clone())),
            otps: Arc::new(SeaOrmOtpRepository::new(db)),
        };

        let (queue, job_rx) = queue::channel();
        let jobs: Arc<dyn JobQueue> = Arc::new(queue);
        let (publisher, event_rx) = ChannelEventPublisher::new();
        let files = Arc::new(LocalFileStorage::new(config.storage_root.clone()));

        let workflow = Arc::new(WatchlistWorkflow::new(
            repos.documents.clone(),
            repos.watchlist.clone(),
            repos.matches.clone(),
            repos.snapshots.clone(),
            files.clone(),
            jobs.clone(),
            Matcher::with_threshold(config.match_threshold),
        ));
        let snapshot_sync = Arc::new(SnapshotSync::new(
            Arc::new(external::SqlExternalPartySource::new(Arc::new(external_db))),
            repos.snapshots.clone(),
        ));
        let job_handler = Arc::new(ComplianceJobHandler::new(workflow, snapshot_sync));

        let mut event_router = EventRouter::new();
        event_router.register(
            EventKind::DocumentCreated,
            Arc::new(DttotDocumentHandler::new(jobs.clone())),
        )?;

        let otp = OtpService::new(
            repos.otps.clone(),
            repos.users.clone(),
            Arc::new(TracingEmailSender::new(config.email_from.clone())),
            config.otp_ttl,
            config.otp_length,
        );
        let service = Arc::new(Service::new(
            repos,
            files,
            Arc::new(publisher),
            jobs.clone(),
            otp,
            config.max_upload_bytes,
        ));

        tracing::info!(
            storage_root = %config.storage_root.display(),
            workers = config.worker_count,
            "Compliance service initialized"
        );

        Ok(Self {
            config,
            service,
            jobs,
            runtime: Mutex::new(Some(Runtime {
                jobs: job_rx,
                job_handler,
                events: event_rx,
                event_router,
            })),
        })
    }

    /// Apply pending database migrations
    pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
        use crate::infra::storage::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(db, None).await?;
        tracing::info!("Compliance service migrations completed");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for other modules
    pub fn client(&self) -> Arc<dyn ComplianceApi> {
        Arc::new(crate::api::native::NativeClient::new(self.service.clone()))
    }

    /// REST routes mounted on a fresh router
    pub fn router(&self) -> axum::Router {
        crate::api::rest::routes::register_routes(
            axum::Router::new(),
            self.service.clone(),
            self.config.max_upload_bytes,
        )
    }

    /// Spawn workers, the event dispatcher and the sync scheduler. Only the first call starts anything.
    pub fn start(&self, cancel: CancellationToken) -> Result<Vec<JoinHandle<()>>> {
        let Some(runtime) = self.runtime.lock().take() else {
            bail!("compliance module already started");
        };

        let pool = WorkerPool::new(
            runtime.job_handler,
            WorkerSettings {
                workers: self.config.worker_count,
                max_attempts: self.config.max_attempts,
                retry_delay: self.config.retry_delay,
            },
        );
        let mut handles = pool.spawn(runtime.jobs, cancel.clone());
        handles.push(spawn_dispatcher(
            runtime.events,
            runtime.event_router,
            cancel.clone(),
        ));

        if let Some(interval) = self.config.snapshot_sync_interval {
            let jobs = self.jobs.clone();
            let cancel = cancel.clone();
            tracing::info!(interval = ?interval, "scheduled snapshot sync enabled");
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            if let Err(e) = jobs.enqueue(Job::SyncExternalSnapshots { party_type: None, ids: None }).await {
                                tracing::error!(error = %e, "failed to queue scheduled snapshot sync");
                            }
                        }
                    }
                }
            }));
        }

        Ok(handles)
    }

    /// Run the background side until `cancel` fires
    pub async fn serve(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        let handles = self.start(cancel.clone())?;
        cancel.cancelled().await;
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
        tracing::info!("Compliance service stopped");
        Ok(())
    }
}
