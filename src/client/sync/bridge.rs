//! # Service Worker Bridge
//!
//! The page-side interface to the service worker. The worker's lifecycle is
//! owned by the platform, not by this engine, so its messages are modeled
//! as an external bus: the host relays whatever the worker posts, and the
//! bridge forwards only recognized sync signals to subscribers.
//!
//! The worker itself (fetch interception with cache-first static assets and
//! network-first API reads, push display, background-sync registration)
//! lives outside this crate. The one contract that matters here: when the
//! platform wakes the worker for background sync, the worker posts a
//! message tagged [`SYNC_MESSAGES_TAG`] to all open page clients, and the
//! sync coordinator treats it exactly like an online transition.

use tokio::sync::broadcast;

/// Background-sync tag registered by the page and echoed by the worker
pub const SYNC_MESSAGES_TAG: &str = "sync-messages";

/// A recognized message from the service worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSignal {
    /// The platform woke the worker for background sync
    SyncRequested {
        /// The background-sync tag that fired
        tag: String,
    },
}

/// Broadcast bus relaying worker messages to the sync engine
#[derive(Debug)]
pub struct WorkerBridge {
    signals: broadcast::Sender<WorkerSignal>,
}

impl WorkerBridge {
    /// Create a bridge with no subscribers yet
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(16);
        Self { signals }
    }

    /// Relay a sync-request message posted by the worker.
    ///
    /// Unrecognized tags are dropped - the worker may grow new message
    /// types without breaking older pages. Returns whether the signal was
    /// relayed.
    pub fn relay_sync_request(&self, tag: &str) -> bool {
        if tag != SYNC_MESSAGES_TAG {
            tracing::debug!("[Bridge] ignoring unrecognized sync tag: {}", tag);
            return false;
        }
        tracing::info!("[Bridge] sync requested by service worker");
        let _ = self.signals.send(WorkerSignal::SyncRequested {
            tag: tag.to_string(),
        });
        true
    }

    /// Subscribe to relayed worker signals
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerSignal> {
        self.signals.subscribe()
    }
}

impl Default for WorkerBridge {
    fn default() -> Self {
        Self::new()
    }
}
