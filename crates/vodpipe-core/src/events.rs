//! Pipeline event hooks
//!
//! Downstream consumers (notification, search indexing, social auto-post) are
//! external collaborators. The pipeline announces completed assets through
//! this trait and otherwise knows nothing about them. Failures are observable
//! by polling asset status, so there is no failure event.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Receiver for "asset became playable" notifications.
///
/// Implementations must tolerate duplicate delivery: a retried run that
/// succeeds after a timeout may announce the same asset twice.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn asset_processed(&self, asset_id: Uuid) -> Result<(), String>;
}

/// No-op implementation for when no consumer is wired up.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn asset_processed(&self, _asset_id: Uuid) -> Result<(), String> {
        Ok(())
    }
}

/// Captures announced asset ids; used by tests.
#[derive(Clone, Default)]
pub struct RecordingEventSink {
    processed: Arc<Mutex<Vec<Uuid>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed_ids(&self) -> Vec<Uuid> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn asset_processed(&self, asset_id: Uuid) -> Result<(), String> {
        self.processed.lock().unwrap().push(asset_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink_accepts_events() {
        let sink = NoopEventSink;
        assert!(sink.asset_processed(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_recording_sink_captures_ids() {
        let sink = RecordingEventSink::new();
        let id = Uuid::new_v4();
        sink.asset_processed(id).await.unwrap();
        sink.asset_processed(id).await.unwrap();
        assert_eq!(sink.processed_ids(), vec![id, id]);
    }
}
