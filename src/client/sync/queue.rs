//! # Outbound Queue
//!
//! The pending-outbound queue shared by the pipeline (which enqueues) and
//! the sync coordinator (which drains). Entries live in memory for the
//! session, ordered by creation time, and are mirrored to the local store
//! so they survive restarts.
//!
//! Memory is authoritative within a session. When the store is absent or a
//! persistence call fails (the `StorageUnavailable` degradation), queueing
//! silently becomes session-only: messages still drain normally, they just
//! don't survive a restart.

use crate::client::store::{LocalStore, PendingMessage};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable-when-possible queue of messages awaiting delivery
#[derive(Debug)]
pub struct OutboundQueue {
    store: Option<Arc<LocalStore>>,
    entries: RwLock<VecDeque<PendingMessage>>,
}

impl OutboundQueue {
    /// Create a queue mirrored to the given store (or memory-only)
    pub fn new(store: Option<Arc<LocalStore>>) -> Self {
        Self {
            store,
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Load entries persisted by previous sessions
    pub async fn hydrate(&self) {
        let Some(store) = &self.store else { return };
        match store.pending_messages().await {
            Ok(persisted) => {
                let mut entries = self.entries.write().await;
                for entry in persisted {
                    if !entries.iter().any(|e| e.local_id == entry.local_id) {
                        entries.push_back(entry);
                    }
                }
                Self::sort(&mut entries);
            }
            Err(e) => {
                tracing::warn!("[Queue] could not hydrate pending messages: {}", e);
            }
        }
    }

    /// Add an entry; idempotent by local id.
    pub async fn enqueue(&self, entry: PendingMessage) {
        {
            let mut entries = self.entries.write().await;
            if entries.iter().any(|e| e.local_id == entry.local_id) {
                return;
            }
            entries.push_back(entry.clone());
            Self::sort(&mut entries);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.put_pending(&entry).await {
                tracing::warn!("[Queue] could not persist entry {}: {}", entry.local_id, e);
            }
        }
    }

    /// Snapshot of the queue in creation-time order
    pub async fn snapshot(&self) -> Vec<PendingMessage> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Whether an entry with this local id is queued
    pub async fn contains(&self, local_id: &str) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| e.local_id == local_id)
    }

    /// Remove an entry; absent id is a no-op.
    pub async fn remove(&self, local_id: &str) {
        self.entries
            .write()
            .await
            .retain(|e| e.local_id != local_id);
        if let Some(store) = &self.store {
            if let Err(e) = store.remove_pending(local_id).await {
                tracing::warn!("[Queue] could not remove entry {}: {}", local_id, e);
            }
        }
    }

    /// Record a failed attempt, returning the new retry count
    pub async fn record_failure(&self, local_id: &str, error: &str) -> u32 {
        let mut count = 0;
        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.iter_mut().find(|e| e.local_id == local_id) {
                entry.retry_count += 1;
                entry.last_attempt = Some(chrono::Utc::now().to_rfc3339());
                entry.last_error = Some(error.to_string());
                count = entry.retry_count;
            }
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.record_pending_failure(local_id, error).await {
                tracing::warn!("[Queue] could not persist retry for {}: {}", local_id, e);
            }
        }
        count
    }

    /// Number of queued messages (badges)
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop every entry (logout)
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        if let Some(store) = &self.store {
            match store.pending_messages().await {
                Ok(persisted) => {
                    for entry in persisted {
                        if let Err(e) = store.remove_pending(&entry.local_id).await {
                            tracing::warn!("[Queue] could not clear {}: {}", entry.local_id, e);
                        }
                    }
                }
                Err(e) => tracing::warn!("[Queue] could not clear persisted entries: {}", e),
            }
        }
    }

    fn sort(entries: &mut VecDeque<PendingMessage>) {
        entries
            .make_contiguous()
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.local_id.cmp(&b.local_id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::messaging::{Message, MessageStatus};
    use uuid::Uuid;

    fn entry(content: &str, created_at: &str) -> PendingMessage {
        let mut m = Message::local_text(
            Uuid::new_v4(),
            Uuid::new_v4(),
            content.to_string(),
            None,
            MessageStatus::Pending,
        );
        m.created_at = created_at.to_string();
        PendingMessage::from_message(&m)
    }

    #[tokio::test]
    async fn test_memory_only_queue() {
        let queue = OutboundQueue::new(None);
        let e = entry("hello", "2026-01-01T10:00:00+00:00");
        queue.enqueue(e.clone()).await;
        queue.enqueue(e.clone()).await; // dedup

        assert_eq!(queue.count().await, 1);
        assert!(queue.contains(&e.local_id).await);

        queue.remove(&e.local_id).await;
        assert_eq!(queue.count().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_creation_ordered() {
        let queue = OutboundQueue::new(None);
        queue.enqueue(entry("second", "2026-01-01T10:00:05+00:00")).await;
        queue.enqueue(entry("first", "2026-01-01T10:00:00+00:00")).await;

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot[0].content, "first");
        assert_eq!(snapshot[1].content, "second");
    }

    #[tokio::test]
    async fn test_failure_bookkeeping() {
        let queue = OutboundQueue::new(None);
        let e = entry("flaky", "2026-01-01T10:00:00+00:00");
        queue.enqueue(e.clone()).await;

        assert_eq!(queue.record_failure(&e.local_id, "timeout").await, 1);
        assert_eq!(queue.record_failure(&e.local_id, "timeout").await, 2);
        assert_eq!(queue.record_failure("absent", "timeout").await, 0);

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot[0].retry_count, 2);
        assert_eq!(snapshot[0].last_error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            LocalStore::open(dir.path().join("offline.db")).await.unwrap(),
        );

        let e = entry("durable", "2026-01-01T10:00:00+00:00");
        {
            let queue = OutboundQueue::new(Some(store.clone()));
            queue.enqueue(e.clone()).await;
        }

        // A fresh session hydrates what the old one queued
        let queue = OutboundQueue::new(Some(store.clone()));
        assert_eq!(queue.count().await, 0);
        queue.hydrate().await;
        assert_eq!(queue.count().await, 1);
        assert!(queue.contains(&e.local_id).await);

        queue.remove(&e.local_id).await;
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }
}
