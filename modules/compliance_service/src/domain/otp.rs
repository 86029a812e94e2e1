//! One-time password issuance and verification over email

use super::credentials::{generate_otp, hash_otp};
use super::repository::{OtpRepository, UserRepository};
use crate::contract::{ComplianceError, OtpCode};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Outbound email transport
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct OtpService {
    otps: Arc<dyn OtpRepository>,
    users: Arc<dyn UserRepository>,
    email: Arc<dyn EmailSender>,
    ttl: Duration,
    code_length: usize,
}

impl OtpService {
    pub fn new(
        otps: Arc<dyn OtpRepository>,
        users: Arc<dyn UserRepository>,
        email: Arc<dyn EmailSender>,
        ttl: Duration,
        code_length: usize,
    ) -> Self {
        Self {
            otps,
            users,
            email,
            ttl,
            code_length,
        }
    }

    /// Issue a code and mail it to the user; returns the expiry
    pub async fn request(&self, user_id: Uuid) -> Result<DateTime<Utc>, ComplianceError> {
        let (user, _) = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(ComplianceError::internal)?
            .ok_or_else(|| ComplianceError::not_found("user", user_id))?;

        let code = generate_otp(self.code_length);
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|e| {
            ComplianceError::internal(anyhow::anyhow!("invalid OTP ttl: {}", e))
        })?;
        let otp = OtpCode {
            id: Uuid::new_v4(),
            user_id,
            code_hash: hash_otp(user_id, &code),
            expires_at: now + ttl,
            consumed_at: None,
            created_at: now,
        };
        self.otps
            .create(&otp)
            .await
            .map_err(ComplianceError::internal)?;

        let body = format!(
            "Your verification code is {}. It expires in {} minutes.",
            code,
            ttl.num_minutes().max(1)
        );
        self.email
            .send(&user.email, "Your verification code", &body)
            .await
            .map_err(ComplianceError::internal)?;

        tracing::info!(user_id = %user_id, expires_at = %otp.expires_at, "OTP issued");
        Ok(otp.expires_at)
    }

    /// Consume a matching active code and mark the user's email verified
    pub async fn verify(&self, user_id: Uuid, code: &str) -> Result<(), ComplianceError> {
        if self
            .users
            .find_by_id(user_id)
            .await
            .map_err(ComplianceError::internal)?
            .is_none()
        {
            return Err(ComplianceError::not_found("user", user_id));
        }

        let now = Utc::now();
        let hash = hash_otp(user_id, code);
        let active = self
            .otps
            .find_active(user_id, now)
            .await
            .map_err(ComplianceError::internal)?;

        let Some(otp) = active.into_iter().find(|o| o.code_hash == hash) else {
            tracing::warn!(user_id = %user_id, "OTP verification failed");
            return Err(ComplianceError::invalid_field(
                "code",
                "invalid or expired code",
            ));
        };

        self.otps
            .consume(otp.id, now)
            .await
            .map_err(ComplianceError::internal)?;
        self.users
            .mark_email_verified(user_id)
            .await
            .map_err(ComplianceError::internal)?;

        tracing::info!(user_id = %user_id, "OTP verified");
        Ok(())
    }
}
