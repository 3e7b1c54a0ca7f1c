//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the sync engine and its host application. These types mirror the wire
//! format of the messaging API and the layout of the local cache.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! anywhere in the client. All types are designed for serialization and
//! transmission over HTTP.

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Messaging types (messages, conversations)
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, SyncConfig, SyncConfigBuilder};
pub use error::SyncError;
pub use event::RealtimeEvent;
pub use messaging::{Conversation, Message, MessageKind, MessageStatus};
