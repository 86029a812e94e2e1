/// Domain events for compliance service
///
/// Events are raised after the originating database write has committed:
/// - `DocumentCreated`: a new document row exists (never raised on update)
///
/// Each event kind has exactly one handler, registered on the `EventRouter`.
use crate::contract::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Domain event types for documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DocumentEvent {
    /// Document row was created
    DocumentCreated(DocumentCreatedEvent),
}

/// Event data for document creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCreatedEvent {
    pub document_id: Uuid,
    /// Type tag of the new document
    pub document_type: String,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// User who uploaded the document (if known)
    pub user_id: Option<Uuid>,
}

/// Discriminant used to route events to their handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DocumentCreated,
}

impl DocumentEvent {
    /// Create a new DocumentCreated event
    pub fn created(document: &Document) -> Self {
        DocumentEvent::DocumentCreated(DocumentCreatedEvent {
            document_id: document.id,
            document_type: document.document_type.clone(),
            timestamp: Utc::now(),
            user_id: document.created_by,
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DocumentEvent::DocumentCreated(_) => EventKind::DocumentCreated,
        }
    }
}

/// Event publisher trait for publishing domain events
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DocumentEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: DocumentEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reaction to one kind of event
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DocumentEvent) -> anyhow::Result<()>;
}

/// Routes each event kind to its single handler
#[derive(Default, Clone)]
pub struct EventRouter {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for an event kind. A kind accepts only one handler.
    pub fn register(
        &mut self,
        kind: EventKind,
        handler: Arc<dyn EventHandler>,
    ) -> anyhow::Result<()> {
        if self.handlers.contains_key(&kind) {
            anyhow::bail!("handler already registered for {:?}", kind);
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Deliver an event to its handler. Events without a handler are dropped.
    pub async fn dispatch(&self, event: &DocumentEvent) -> anyhow::Result<()> {
        match self.handlers.get(&event.kind()) {
            Some(handler) => handler.handle(event).await,
            None => {
                tracing::debug!(kind = ?event.kind(), "no handler registered, dropping event");
                Ok(())
            }
        }
    }
}
