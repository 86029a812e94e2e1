//! In-process event delivery
//!
//! `ChannelEventPublisher` pushes events onto an unbounded channel; a single
//! dispatcher task drains it into the `EventRouter`. Handler failures are
//! logged and the event is dropped.

use crate::domain::events::{DocumentEvent, EventHandler, EventPublisher, EventRouter};
use crate::domain::jobs::{Job, JobQueue};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ChannelEventPublisher {
    tx: mpsc::UnboundedSender<DocumentEvent>,
}

impl ChannelEventPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DocumentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(&self, event: DocumentEvent) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("event dispatcher is not running"))
    }
}

/// Drain the channel into the router until cancelled
pub fn spawn_dispatcher(
    mut rx: mpsc::UnboundedReceiver<DocumentEvent>,
    router: EventRouter,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            if let Err(e) = router.dispatch(&event).await {
                tracing::error!(kind = ?event.kind(), error = %e, "event handler failed");
            }
        }
        tracing::debug!("event dispatcher stopped");
    })
}

/// Queues the ETL workflow for newly created DTTOT documents
pub struct DttotDocumentHandler {
    jobs: Arc<dyn JobQueue>,
}

impl DttotDocumentHandler {
    pub fn new(jobs: Arc<dyn JobQueue>) -> Self {
        Self { jobs }
    }
}

#[async_trait::async_trait]
impl EventHandler for DttotDocumentHandler {
    async fn handle(&self, event: &DocumentEvent) -> anyhow::Result<()> {
        let DocumentEvent::DocumentCreated(created) = event;
        if created.document_type != crate::contract::DTTOT_DOCUMENT_TYPE {
            return Ok(());
        }
        tracing::info!(document_id = %created.document_id, "queueing DTTOT workflow");
        self.jobs
            .enqueue(Job::ProcessWatchlistDocument {
                document_id: created.document_id,
                requested_by: created.user_id,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{DocumentCreatedEvent, EventKind};
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingQueue(Mutex<Vec<Job>>);

    #[async_trait::async_trait]
    impl JobQueue for RecordingQueue {
        async fn enqueue(&self, job: Job) -> anyhow::Result<()> {
            self.0.lock().push(job);
            Ok(())
        }
    }

    fn created(document_type: &str) -> (Uuid, DocumentEvent) {
        let id = Uuid::new_v4();
        let event = DocumentEvent::DocumentCreated(DocumentCreatedEvent {
            document_id: id,
            document_type: document_type.to_string(),
            timestamp: Utc::now(),
            user_id: None,
        });
        (id, event)
    }

    #[tokio::test]
    async fn test_published_dttot_event_reaches_queue() {
        let queue = Arc::new(RecordingQueue::default());
        let mut router = EventRouter::new();
        router
            .register(
                EventKind::DocumentCreated,
                Arc::new(DttotDocumentHandler::new(queue.clone())),
            )
            .unwrap();

        let (publisher, rx) = ChannelEventPublisher::new();
        let cancel = CancellationToken::new();
        let handle = spawn_dispatcher(rx, router, cancel.clone());

        let (id, event) = created(crate::contract::DTTOT_DOCUMENT_TYPE);
        publisher.publish(event).await.unwrap();

        for _ in 0..100 {
            if !queue.0.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            *queue.0.lock(),
            vec![Job::ProcessWatchlistDocument {
                document_id: id,
                requested_by: None
            }]
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_document_types_are_ignored() {
        let queue = Arc::new(RecordingQueue::default());
        let handler = DttotDocumentHandler::new(queue.clone());
        let (_, event) = created("Invoice");
        handler.handle(&event).await.unwrap();
        assert!(queue.0.lock().is_empty());
    }
}
