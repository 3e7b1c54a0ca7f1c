//! # Connectivity Monitor
//!
//! Tracks the online/offline state of the client and broadcasts
//! edge-triggered transitions. Platform integrations (browser
//! online/offline events, OS network callbacks, a heartbeat probe owned by
//! someone else) feed raw signals through [`ConnectivityMonitor::set_online`];
//! subscribers only ever see real edges, because platform events fire
//! redundantly.
//!
//! The monitor performs no network probing of its own. A false positive
//! (reported online but actually unreachable) is acceptable: the sync
//! coordinator's failure path covers it.
//!
//! Each monitor is an isolated instance - construct one per engine (or per
//! test) instead of sharing process-wide listener state.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// An observed online/offline transition edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// Transitioned from offline to online
    Online,
    /// Transitioned from online to offline
    Offline,
}

/// Edge-triggered connectivity state holder
#[derive(Debug)]
pub struct ConnectivityMonitor {
    online: AtomicBool,
    transitions: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state
    pub fn new(initially_online: bool) -> Self {
        let (transitions, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(initially_online),
            transitions,
        }
    }

    /// Current observed state
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Feed a platform connectivity signal.
    ///
    /// Broadcasts only when the observed state actually changes; redundant
    /// signals are swallowed.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }
        let event = if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };
        tracing::info!("[Connectivity] transition: {:?}", event);
        // send() fails only when nobody subscribed yet; that's fine.
        let _ = self.transitions.send(event);
    }

    /// Subscribe to transition edges
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.transitions.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        // Mirrors the platform default: assume online until told otherwise.
        Self::new(true)
    }
}
