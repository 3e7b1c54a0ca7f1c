//! # Network Send Endpoint
//!
//! The seam between the sync engine and the messaging API. The engine only
//! needs two operations - create a message, delete a message - and a
//! classification of every failure into *transient* (retry later) or
//! *rejected* (terminal), so the whole surface is one small trait.
//!
//! Classification rules:
//! - transport failures (timeout, refused connection, DNS) and 5xx
//!   responses are transient -> `SyncError::Connectivity`;
//! - 4xx responses are rejections -> `SyncError::RejectedByServer`, with
//!   the server's `{"error": ...}` body when present;
//! - deleting a message the server no longer has (404) is a success, since
//!   the goal state already holds.

use crate::shared::config::SyncConfig;
use crate::shared::error::SyncError;
use crate::shared::messaging::{Message, MessageKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload for creating a message server-side
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewMessage {
    /// Conversation to post into
    pub conversation_id: Uuid,
    /// Author of the message
    pub sender_id: Uuid,
    /// Message kind
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text body or voice asset URL
    pub content: String,
    /// Voice duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Reply reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

/// The message-creation endpoint as the sync engine sees it
#[async_trait]
pub trait MessageEndpoint: Send + Sync {
    /// Submit a message and receive the durable server record
    async fn create_message(&self, draft: &NewMessage) -> Result<Message, SyncError>;

    /// Hard-delete a message by durable id
    async fn delete_message(&self, message_id: &str) -> Result<(), SyncError>;
}

/// Successful creation envelope: `{ "message": { ... } }`
#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Message,
}

/// Error envelope: `{ "error": "..." }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP implementation of [`MessageEndpoint`]
#[derive(Debug, Clone)]
pub struct HttpMessageEndpoint {
    client: reqwest::Client,
    server_url: String,
}

impl HttpMessageEndpoint {
    /// Build an endpoint from the engine configuration.
    ///
    /// The request timeout bounds every send attempt; a timeout classifies
    /// as a connectivity failure, never as a rejection.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.send_timeout)
            .build()
            .map_err(|e| SyncError::connectivity(e.to_string()))?;
        Ok(Self {
            client,
            server_url: config.server_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// Map a failed response into the transient/rejected taxonomy
    async fn classify_response(response: reqwest::Response) -> SyncError {
        let status = response.status();
        let body_message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| status.to_string());

        if status.is_server_error() {
            SyncError::connectivity(format!("server error {}: {}", status.as_u16(), body_message))
        } else {
            SyncError::rejected(status.as_u16(), body_message)
        }
    }
}

fn classify_transport(err: reqwest::Error) -> SyncError {
    SyncError::connectivity(err.to_string())
}

#[async_trait]
impl MessageEndpoint for HttpMessageEndpoint {
    async fn create_message(&self, draft: &NewMessage) -> Result<Message, SyncError> {
        let response = self
            .client
            .post(self.url("/api/messages"))
            .json(draft)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(Self::classify_response(response).await);
        }

        let envelope: MessageEnvelope = response
            .json()
            .await
            .map_err(|e| SyncError::connectivity(format!("malformed response: {}", e)))?;
        Ok(envelope.message)
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), SyncError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/messages/{}", message_id)))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }
        Err(Self::classify_response(response).await)
    }
}
