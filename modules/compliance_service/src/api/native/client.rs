//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    ComplianceApi, ComplianceError, Document, MatchRecord, PartySnapshot, PartyType, User,
    UserProfile, WatchlistReport,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Native client that calls the domain service directly, without HTTP
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ComplianceApi for NativeClient {
    async fn get_document(&self, id: Uuid) -> Result<Document, ComplianceError> {
        self.service.get_document(id).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, ComplianceError> {
        self.service.list_documents().await
    }

    async fn get_report_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<WatchlistReport, ComplianceError> {
        self.service.get_report_for_document(document_id).await
    }

    async fn list_matches(
        &self,
        report_id: Uuid,
        party_type: PartyType,
    ) -> Result<Vec<MatchRecord>, ComplianceError> {
        self.service.list_matches(report_id, party_type).await
    }

    async fn list_snapshots(
        &self,
        party_type: Option<PartyType>,
    ) -> Result<Vec<PartySnapshot>, ComplianceError> {
        self.service.list_snapshots(party_type).await
    }

    async fn get_user(&self, id: Uuid) -> Result<(User, UserProfile), ComplianceError> {
        self.service.get_user(id).await
    }
}
