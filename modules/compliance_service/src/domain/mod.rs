//! Domain layer - business logic and services

pub mod credentials;
pub mod etl;
pub mod events;
pub mod files;
pub mod jobs;
pub mod matching;
pub mod otp;
pub mod repository;
pub mod service;
pub mod snapshot_sync;
pub mod validation;
pub mod workflow;

pub use events::{DocumentEvent, EventHandler, EventKind, EventPublisher, EventRouter, NoOpEventPublisher};
pub use files::FileStorage;
pub use jobs::{ComplianceJobHandler, Job, JobHandler, JobQueue};
pub use matching::Matcher;
pub use otp::{EmailSender, OtpService};
pub use repository::{
    DocumentRepository, MatchRepository, OtpRepository, SnapshotRepository, UserRepository,
    WatchlistRepository,
};
pub use service::{NewDocument, ReportUpdate, Repositories, Service};
pub use snapshot_sync::{ExternalParty, ExternalPartySource, SnapshotSync};
pub use validation::MatchInput;
pub use workflow::WatchlistWorkflow;
