//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.

pub mod client;
pub mod error;
pub mod model;

pub use client::ComplianceApi;
pub use error::{ComplianceError, FieldError};
pub use model::{
    Document, FileType, MatchRecord, NewUser, OtpCode, PartyKind, PartySnapshot, PartyType,
    ReportStatus, User, UserProfile, WatchlistEntry, WatchlistReport, DTTOT_DOCUMENT_TYPE,
};
