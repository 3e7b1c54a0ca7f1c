//! Test doubles shared by the engine's unit tests

use crate::client::api::{MessageEndpoint, NewMessage};
use crate::shared::error::SyncError;
use crate::shared::messaging::{Message, MessageStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Scriptable endpoint: pops one outcome per `create_message` call,
/// succeeding once the script runs out. Successes fabricate a durable
/// server record from the draft.
pub(crate) struct StubEndpoint {
    outcomes: Mutex<VecDeque<Result<(), SyncError>>>,
    calls: Mutex<Vec<NewMessage>>,
    delay: Option<Duration>,
}

impl StubEndpoint {
    pub(crate) fn always_ok() -> Self {
        Self::scripted(vec![])
    }

    pub(crate) fn scripted(outcomes: Vec<Result<(), SyncError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Add an artificial latency to every call (for concurrency tests)
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageEndpoint for StubEndpoint {
    async fn create_message(&self, draft: &NewMessage) -> Result<Message, SyncError> {
        self.calls.lock().unwrap().push(draft.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome?;
        Ok(server_record(draft))
    }

    async fn delete_message(&self, _message_id: &str) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Fabricate the durable record the server would mint for a draft
pub(crate) fn server_record(draft: &NewMessage) -> Message {
    Message {
        id: Uuid::new_v4().to_string(),
        conversation_id: draft.conversation_id,
        sender_id: draft.sender_id,
        kind: draft.kind,
        content: draft.content.clone(),
        duration: draft.duration,
        reply_to_id: draft.reply_to_id.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
        read_at: None,
        status: MessageStatus::Sent,
    }
}
