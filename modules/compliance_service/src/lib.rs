//! Compliance Service Module
//!
//! Back office for DTTOT watchlist screening: document intake, the watchlist
//! ETL workflow, per-party-type match records, external party snapshots, and
//! user registration with email OTP verification.

// Public exports
pub mod contract;
pub use contract::{
    client::ComplianceApi, error::ComplianceError, Document, FileType, MatchRecord, PartyKind,
    PartySnapshot, PartyType, ReportStatus, WatchlistEntry, WatchlistReport,
};

pub mod config;
pub use config::Config;

pub mod module;
pub use module::ComplianceModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
