//! SeaORM repository implementations

use crate::contract::{
    Document, MatchRecord, OtpCode, PartySnapshot, PartyType, User, UserProfile, WatchlistEntry,
    WatchlistReport,
};
use crate::domain::repository::{
    DocumentRepository, MatchRepository, OtpRepository, SnapshotRepository, UserRepository,
    WatchlistRepository,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::entity::{
    document, match_record, otp_code, party_snapshot, user, user_profile, watchlist_entry,
    watchlist_report,
};

/// Rows per multi-row INSERT; keeps entry batches under SQLite's bind limit
const INSERT_CHUNK: usize = 500;

fn convert_all<M, T>(models: Vec<M>) -> Result<Vec<T>>
where
    T: TryFrom<M, Error = anyhow::Error>,
{
    models.into_iter().map(T::try_from).collect()
}

// ===== Documents =====

pub struct SeaOrmDocumentRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmDocumentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for SeaOrmDocumentRepository {
    async fn create(&self, document: &Document) -> Result<Document> {
        let active: document::ActiveModel = document.into();
        let model = active.insert(&*self.db).await?;
        model.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        document::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Document::try_from)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Document>> {
        let models = document::Entity::find()
            .order_by_desc(document::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        convert_all(models)
    }

    async fn update(&self, document: &Document) -> Result<Document> {
        let active: document::ActiveModel = document.into();
        let model = active.update(&*self.db).await?;
        model.try_into()
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<bool> {
        let txn = self.db.begin().await?;

        let report_ids: Vec<Uuid> = watchlist_report::Entity::find()
            .select_only()
            .column(watchlist_report::Column::Id)
            .filter(watchlist_report::Column::DocumentId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !report_ids.is_empty() {
            match_record::Entity::delete_many()
                .filter(match_record::Column::ReportId.is_in(report_ids))
                .exec(&txn)
                .await?;
        }
        watchlist_report::Entity::delete_many()
            .filter(watchlist_report::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        watchlist_entry::Entity::delete_many()
            .filter(watchlist_entry::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        let result = document::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

// ===== Watchlist =====

pub struct SeaOrmWatchlistRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmWatchlistRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WatchlistRepository for SeaOrmWatchlistRepository {
    async fn create_report(&self, report: &WatchlistReport) -> Result<WatchlistReport> {
        let active: watchlist_report::ActiveModel = report.into();
        let model = active.insert(&*self.db).await?;
        model.try_into()
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<WatchlistReport>> {
        watchlist_report::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(WatchlistReport::try_from)
            .transpose()
    }

    async fn find_report_by_document(&self, document_id: Uuid) -> Result<Option<WatchlistReport>> {
        watchlist_report::Entity::find()
            .filter(watchlist_report::Column::DocumentId.eq(document_id))
            .one(&*self.db)
            .await?
            .map(WatchlistReport::try_from)
            .transpose()
    }

    async fn list_reports(&self) -> Result<Vec<WatchlistReport>> {
        let models = watchlist_report::Entity::find()
            .order_by_desc(watchlist_report::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        convert_all(models)
    }

    async fn update_report(&self, report: &WatchlistReport) -> Result<WatchlistReport> {
        let active: watchlist_report::ActiveModel = report.into();
        let model = active.update(&*self.db).await?;
        model.try_into()
    }

    async fn delete_report(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        match_record::Entity::delete_many()
            .filter(match_record::Column::ReportId.eq(id))
            .exec(&txn)
            .await?;
        watchlist_report::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn store_entries(&self, report: &WatchlistReport, entries: &[WatchlistEntry]) -> Result<()> {
        let txn = self.db.begin().await?;

        // reprocessing replaces the previous rows of the document
        watchlist_entry::Entity::delete_many()
            .filter(watchlist_entry::Column::DocumentId.eq(report.document_id))
            .exec(&txn)
            .await?;

        for chunk in entries.chunks(INSERT_CHUNK) {
            let models: Vec<watchlist_entry::ActiveModel> = chunk.iter().map(Into::into).collect();
            watchlist_entry::Entity::insert_many(models)
                .exec_without_returning(&txn)
                .await?;
        }

        let active: watchlist_report::ActiveModel = report.into();
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<WatchlistEntry>> {
        watchlist_entry::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(WatchlistEntry::try_from)
            .transpose()
    }

    async fn list_entries(&self, document_id: Uuid) -> Result<Vec<WatchlistEntry>> {
        let models = watchlist_entry::Entity::find()
            .filter(watchlist_entry::Column::DocumentId.eq(document_id))
            .order_by_asc(watchlist_entry::Column::RowNumber)
            .all(&*self.db)
            .await?;
        convert_all(models)
    }
}

// ===== Match records =====

pub struct SeaOrmMatchRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmMatchRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_by_natural_key(&self, record: &MatchRecord) -> Result<Option<MatchRecord>> {
        match_record::Entity::find()
            .filter(match_record::Column::ReportId.eq(record.report_id))
            .filter(match_record::Column::PartyType.eq(record.party_type.as_str()))
            .filter(match_record::Column::ExternalPartyId.eq(record.external_party_id.as_str()))
            .filter(match_record::Column::MatchedCode.eq(record.matched_code.as_str()))
            .one(&*self.db)
            .await?
            .map(MatchRecord::try_from)
            .transpose()
    }
}

#[async_trait]
impl MatchRepository for SeaOrmMatchRepository {
    async fn upsert(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let active: match_record::ActiveModel = record.into();
        match_record::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    match_record::Column::ReportId,
                    match_record::Column::PartyType,
                    match_record::Column::ExternalPartyId,
                    match_record::Column::MatchedCode,
                ])
                .update_columns([
                    match_record::Column::SimilarityScore,
                    match_record::Column::WatchlistEntryId,
                    match_record::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        self.find_by_natural_key(record)
            .await?
            .ok_or_else(|| anyhow!("match record vanished after upsert"))
    }

    async fn create(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let active: match_record::ActiveModel = record.into();
        let model = active.insert(&*self.db).await?;
        model.try_into()
    }

    async fn find_by_id(&self, party_type: PartyType, id: Uuid) -> Result<Option<MatchRecord>> {
        match_record::Entity::find_by_id(id)
            .filter(match_record::Column::PartyType.eq(party_type.as_str()))
            .one(&*self.db)
            .await?
            .map(MatchRecord::try_from)
            .transpose()
    }

    async fn list(&self, report_id: Uuid, party_type: PartyType) -> Result<Vec<MatchRecord>> {
        let models = match_record::Entity::find()
            .filter(match_record::Column::ReportId.eq(report_id))
            .filter(match_record::Column::PartyType.eq(party_type.as_str()))
            .order_by_desc(match_record::Column::SimilarityScore)
            .order_by_asc(match_record::Column::ExternalPartyId)
            .all(&*self.db)
            .await?;
        convert_all(models)
    }

    async fn update(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let active: match_record::ActiveModel = record.into();
        let model = active.update(&*self.db).await?;
        model.try_into()
    }

    async fn delete(&self, party_type: PartyType, id: Uuid) -> Result<bool> {
        let result = match_record::Entity::delete_many()
            .filter(match_record::Column::Id.eq(id))
            .filter(match_record::Column::PartyType.eq(party_type.as_str()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

// ===== External party snapshots =====

pub struct SeaOrmSnapshotRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSnapshotRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotRepository for SeaOrmSnapshotRepository {
    async fn upsert_many(&self, snapshots: &[PartySnapshot]) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        for chunk in snapshots.chunks(INSERT_CHUNK) {
            let models: Vec<party_snapshot::ActiveModel> = chunk.iter().map(Into::into).collect();
            party_snapshot::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::columns([
                        party_snapshot::Column::PartyType,
                        party_snapshot::Column::ExternalPartyId,
                    ])
                    .update_columns([
                        party_snapshot::Column::Name,
                        party_snapshot::Column::NationalId,
                        party_snapshot::Column::PassportNumber,
                        party_snapshot::Column::BirthDate,
                        party_snapshot::Column::Nationality,
                        party_snapshot::Column::Email,
                        party_snapshot::Column::SyncedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(snapshots.len())
    }

    async fn list(&self, party_type: Option<PartyType>) -> Result<Vec<PartySnapshot>> {
        let mut query = party_snapshot::Entity::find();
        if let Some(party_type) = party_type {
            query = query.filter(party_snapshot::Column::PartyType.eq(party_type.as_str()));
        }
        let models = query
            .order_by_asc(party_snapshot::Column::PartyType)
            .order_by_asc(party_snapshot::Column::ExternalPartyId)
            .all(&*self.db)
            .await?;
        convert_all(models)
    }
}

// ===== Users =====

pub struct SeaOrmUserRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmUserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create_with_profile(&self, user: &User, profile: &UserProfile) -> Result<()> {
        let txn = self.db.begin().await?;
        user::Entity::insert(user::ActiveModel::from(user))
            .exec_without_returning(&txn)
            .await?;
        user_profile::Entity::insert(user_profile::ActiveModel::from(profile))
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<(User, UserProfile)>> {
        let found = user::Entity::find_by_id(id)
            .find_also_related(user_profile::Entity)
            .one(&*self.db)
            .await?;

        match found {
            None => Ok(None),
            Some((user, Some(profile))) => Ok(Some((user.into(), profile.into()))),
            Some((user, None)) => Err(anyhow!("user {} has no profile", user.id)),
        }
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let count = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&*self.db)
            .await?;
        Ok(count > 0)
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> Result<()> {
        user_profile::Entity::update_many()
            .col_expr(user_profile::Column::EmailVerified, Expr::value(true))
            .col_expr(user_profile::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user_profile::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}

// ===== OTP codes =====

pub struct SeaOrmOtpRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmOtpRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OtpRepository for SeaOrmOtpRepository {
    async fn create(&self, otp: &OtpCode) -> Result<()> {
        otp_code::Entity::insert(otp_code::ActiveModel::from(otp))
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }

    async fn find_active(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<OtpCode>> {
        let models = otp_code::Entity::find()
            .filter(otp_code::Column::UserId.eq(user_id))
            .filter(otp_code::Column::ConsumedAt.is_null())
            .filter(otp_code::Column::ExpiresAt.gt(now))
            .order_by_desc(otp_code::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        otp_code::Entity::update_many()
            .col_expr(otp_code::Column::ConsumedAt, Expr::value(at))
            .filter(otp_code::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}
