//! Configuration for compliance service module

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Compliance service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root directory for uploaded files
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    /// Maximum upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Minimum similarity score for a match record
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Number of background job workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Attempts per job before it is dropped
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between job attempts
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Scheduled external snapshot sync; disabled when absent
    #[serde(default, with = "humantime_serde")]
    pub snapshot_sync_interval: Option<Duration>,

    /// Lifetime of an issued OTP
    #[serde(default = "default_otp_ttl", with = "humantime_serde")]
    pub otp_ttl: Duration,

    /// Digits per OTP
    #[serde(default = "default_otp_length")]
    pub otp_length: usize,

    /// Sender address of outgoing mail
    #[serde(default = "default_email_from")]
    pub email_from: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            max_upload_bytes: default_max_upload_bytes(),
            match_threshold: default_match_threshold(),
            worker_count: default_worker_count(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            snapshot_sync_interval: None,
            otp_ttl: default_otp_ttl(),
            otp_length: default_otp_length(),
            email_from: default_email_from(),
        }
    }
}

impl Config {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            anyhow::bail!(
                "match_threshold must be within [0, 1], got {}",
                self.match_threshold
            );
        }
        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be at least 1");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if !(4..=10).contains(&self.otp_length) {
            anyhow::bail!("otp_length must be between 4 and 10");
        }
        Ok(())
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/uploads")
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024 // 20MB
}

fn default_match_threshold() -> f64 {
    0.85
}

fn default_worker_count() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_otp_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_otp_length() -> usize {
    6
}

fn default_email_from() -> String {
    "no-reply@compliance.local".to_string()
}
