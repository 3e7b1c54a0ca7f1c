//! # Sync Coordinator
//!
//! Drains the pending-outbound queue whenever triggered: by a connectivity
//! transition back online, by a background-sync signal relayed from the
//! service worker, or by an explicit user-initiated retry.
//!
//! ## Drain semantics
//!
//! Only one drain runs at a time - concurrent triggers fall through a
//! `try_lock` and return immediately, so re-entrant signals can never
//! double-send a queued entry. Entries are attempted in creation-time
//! order through the same network path as a direct send. A transient
//! failure charges the entry's retry counter; at the ceiling the entry is
//! dropped from the queue and the message surfaces as permanently failed.
//! A pass that fails entirely (connectivity was a false positive) leaves
//! the queue for the next trigger - that is expected, not an error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn example(coordinator: std::sync::Arc<safespace::client::sync::SyncCoordinator>,
//! #                  bridge: safespace::client::sync::bridge::WorkerBridge) {
//! let handle = coordinator.start(&bridge);
//! let report = coordinator.drain().await;
//! println!("synced {} of {}", report.synced, report.synced + report.pending);
//! handle.stop();
//! # }
//! ```

pub mod bridge;
pub mod queue;

pub use bridge::{WorkerBridge, WorkerSignal, SYNC_MESSAGES_TAG};
pub use queue::OutboundQueue;

use crate::client::api::MessageEndpoint;
use crate::client::connectivity::{ConnectivityEvent, ConnectivityMonitor};
use crate::client::pipeline::{draft_of, MessagePipeline};
use crate::shared::error::SyncError;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;

/// Outcome of one drain pass (the shape the UI shows in a sync toast)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries delivered and confirmed
    pub synced: usize,
    /// Entries abandoned (rejected or over the retry ceiling)
    pub failed: usize,
    /// Entries still queued after the pass
    pub pending: usize,
    /// The pass was skipped (another drain was in flight, or offline)
    pub skipped: bool,
}

impl SyncReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Drains the outbound queue on demand
pub struct SyncCoordinator {
    queue: Arc<OutboundQueue>,
    endpoint: Arc<dyn MessageEndpoint>,
    pipeline: Arc<MessagePipeline>,
    monitor: Arc<ConnectivityMonitor>,
    retry_ceiling: u32,
    drain_lock: Mutex<()>,
}

impl SyncCoordinator {
    /// Create a coordinator over the given collaborators
    pub fn new(
        queue: Arc<OutboundQueue>,
        endpoint: Arc<dyn MessageEndpoint>,
        pipeline: Arc<MessagePipeline>,
        monitor: Arc<ConnectivityMonitor>,
        retry_ceiling: u32,
    ) -> Self {
        Self {
            queue,
            endpoint,
            pipeline,
            monitor,
            retry_ceiling,
            drain_lock: Mutex::new(()),
        }
    }

    /// Drain the queue once. Non-reentrant: a call arriving while another
    /// drain is in flight returns a skipped report immediately.
    pub async fn drain(&self) -> SyncReport {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            tracing::debug!("[Sync] drain already in flight, skipping");
            return SyncReport::skipped();
        };

        if !self.monitor.is_online() {
            tracing::debug!("[Sync] offline, leaving queue untouched");
            let mut report = SyncReport::skipped();
            report.pending = self.queue.count().await;
            return report;
        }

        let entries = self.queue.snapshot().await;
        if entries.is_empty() {
            return SyncReport::default();
        }
        tracing::info!("[Sync] syncing {} pending messages", entries.len());

        let mut report = SyncReport::default();
        for entry in entries {
            // Leftovers over the ceiling (from an older session) are
            // abandoned without burning another attempt.
            if entry.retry_count >= self.retry_ceiling {
                tracing::info!("[Sync] {} exceeded max retries, removing", entry.local_id);
                self.queue.remove(&entry.local_id).await;
                self.pipeline
                    .mark_send_failed(&entry.local_id, entry.conversation_id)
                    .await;
                report.failed += 1;
                continue;
            }

            let draft = draft_of(&entry.to_message());
            match self.endpoint.create_message(&draft).await {
                Ok(server) => {
                    self.queue.remove(&entry.local_id).await;
                    self.pipeline
                        .resolve_delivery(&entry.local_id, server)
                        .await;
                    report.synced += 1;
                    tracing::info!("[Sync] {} synced successfully", entry.local_id);
                }
                Err(e) if !e.is_transient() => {
                    // The server looked at it and said no; retrying the
                    // same payload cannot help.
                    tracing::warn!("[Sync] {} rejected: {}", entry.local_id, e);
                    self.queue.remove(&entry.local_id).await;
                    self.pipeline
                        .mark_send_failed(&entry.local_id, entry.conversation_id)
                        .await;
                    report.failed += 1;
                }
                Err(e) => {
                    let attempts = self
                        .queue
                        .record_failure(&entry.local_id, &e.to_string())
                        .await;
                    if attempts >= self.retry_ceiling {
                        let abandoned = SyncError::RetryCeilingExceeded {
                            local_id: entry.local_id.clone(),
                        };
                        tracing::warn!("[Sync] {} after {} attempts", abandoned, attempts);
                        self.queue.remove(&entry.local_id).await;
                        self.pipeline
                            .mark_send_failed(&entry.local_id, entry.conversation_id)
                            .await;
                        report.failed += 1;
                    } else {
                        tracing::info!(
                            "[Sync] {} failed to sync (attempt {}): {}",
                            entry.local_id,
                            attempts,
                            e
                        );
                    }
                }
            }
        }

        report.pending = self.queue.count().await;
        report
    }

    /// Spawn the trigger listener: drains on every online transition and
    /// every recognized worker signal. The returned handle aborts the
    /// listener when stopped or dropped.
    pub fn start(self: &Arc<Self>, bridge: &WorkerBridge) -> SyncHandle {
        let coordinator = Arc::clone(self);
        let mut transitions = self.monitor.subscribe();
        let mut signals = bridge.subscribe();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = transitions.recv() => match event {
                        Ok(ConnectivityEvent::Online) => {
                            coordinator.drain().await;
                        }
                        Ok(ConnectivityEvent::Offline) => {}
                        Err(RecvError::Lagged(_)) => {
                            // Missed edges collapse into one catch-up drain
                            coordinator.drain().await;
                        }
                        Err(RecvError::Closed) => break,
                    },
                    signal = signals.recv() => match signal {
                        Ok(WorkerSignal::SyncRequested { .. }) => {
                            coordinator.drain().await;
                        }
                        Err(RecvError::Lagged(_)) => {
                            coordinator.drain().await;
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        SyncHandle { task }
    }
}

/// Running trigger listener; aborts on stop or drop
#[derive(Debug)]
pub struct SyncHandle {
    task: tokio::task::JoinHandle<()>,
}

impl SyncHandle {
    /// Stop listening for triggers
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
