//! SafeSpace - Offline Messaging Engine
//!
//! SafeSpace is an anonymous peer-support messaging application connecting
//! patients to counselors. This crate implements the client-side offline
//! messaging engine: a durable local cache, an outbound queue that survives
//! restarts, an optimistic send pipeline, and a sync coordinator that drains
//! queued messages when connectivity returns.
//!
//! # Overview
//!
//! The engine guarantees three things about an outbound message:
//! - it is visible to the user immediately, whatever the network state;
//! - it is never rendered twice, even when the server's realtime broadcast
//!   races the direct send response;
//! - it is never silently lost: a message composed offline is delivered once
//!   connectivity returns, or surfaced as permanently failed after the retry
//!   ceiling.
//!
//! # Module Structure
//!
//! The library is organized into two main modules:
//!
//! - **`shared`** - Platform-agnostic types
//!   - Message and conversation structures, realtime events
//!   - Configuration
//!   - Error types
//!
//! - **`client`** - The offline sync engine
//!   - Durable local store (SQLite)
//!   - Connectivity monitor
//!   - Optimistic message pipeline
//!   - Sync coordinator and service-worker bridge
//!   - Presence cache
//!
//! # Usage
//!
//! ```rust,no_run
//! use safespace::client::MessagingClient;
//! use safespace::shared::config::SyncConfig;
//!
//! # async fn example() -> Result<(), safespace::shared::error::SyncError> {
//! let client = MessagingClient::new(SyncConfig::default()).await?;
//! client.start().await;
//! # Ok(())
//! # }
//! ```
//!
//! # External Collaborators
//!
//! The HTTP API, the relational schema, the UI tree and the service worker
//! itself live outside this crate. The engine talks to them through narrow
//! seams: the [`client::api::MessageEndpoint`] trait, the realtime event
//! channel in [`shared::event`], and the worker signal bus in
//! [`client::sync::bridge`].
//!
//! # Thread Safety
//!
//! All engine state is shared via `Arc` with `tokio::sync` primitives.
//! Execution is event-driven: sends, store access and drains are awaited
//! units; realtime pushes arrive on a broadcast channel and are merged into
//! whatever state exists at arrival time.

/// Shared types and data structures
pub mod shared;

/// Client-side offline sync engine
pub mod client;
