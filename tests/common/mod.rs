//! Common test utilities and helpers
//!
//! Shared fixtures for the integration suites: a scriptable endpoint
//! double, a temp-file store, and an assembled engine harness.

// Each suite uses a subset of these helpers
#![allow(dead_code)]

use async_trait::async_trait;
use safespace::client::api::{MessageEndpoint, NewMessage};
use safespace::client::connectivity::ConnectivityMonitor;
use safespace::client::pipeline::MessagePipeline;
use safespace::client::store::LocalStore;
use safespace::client::sync::{OutboundQueue, SyncCoordinator};
use safespace::shared::error::SyncError;
use safespace::shared::messaging::{Message, MessageStatus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use uuid::Uuid;

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary; `RUST_LOG=debug` shows the
/// engine's tracing output on failures.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Scriptable endpoint: pops one outcome per `create_message` call,
/// succeeding once the script runs out. Successes fabricate the durable
/// record the server would mint.
pub struct ScriptedEndpoint {
    outcomes: Mutex<VecDeque<Result<(), SyncError>>>,
    records: Mutex<VecDeque<Message>>,
    calls: Mutex<Vec<NewMessage>>,
    deletes: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedEndpoint {
    pub fn always_ok() -> Self {
        Self::scripted(vec![])
    }

    pub fn scripted(outcomes: Vec<Result<(), SyncError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            records: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Serve these exact records (in order) instead of fabricating them -
    /// lets a test line the direct response up with a realtime push.
    pub fn with_records(self, records: Vec<Message>) -> Self {
        *self.records.lock().unwrap() = records.into_iter().collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageEndpoint for ScriptedEndpoint {
    async fn create_message(&self, draft: &NewMessage) -> Result<Message, SyncError> {
        self.calls.lock().unwrap().push(draft.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome?;
        if let Some(record) = self.records.lock().unwrap().pop_front() {
            return Ok(record);
        }
        Ok(server_record(draft))
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), SyncError> {
        self.deletes.lock().unwrap().push(message_id.to_string());
        Ok(())
    }
}

/// Fabricate the durable record the server would mint for a draft
pub fn server_record(draft: &NewMessage) -> Message {
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

/// An assembled engine over a scriptable endpoint and a temp-file store
pub struct Harness {
    pub endpoint: Arc<ScriptedEndpoint>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub store: Option<Arc<LocalStore>>,
    pub queue: Arc<OutboundQueue>,
    pub pipeline: Arc<MessagePipeline>,
    pub coordinator: Arc<SyncCoordinator>,
    _dir: Option<tempfile::TempDir>,
}

impl Harness {
    /// Engine without durable storage
    pub fn in_memory(endpoint: ScriptedEndpoint, online: bool) -> Self {
        Self::assemble(endpoint, online, None, None)
    }

    /// Engine backed by a fresh temp-file store
    pub async fn durable(endpoint: ScriptedEndpoint, online: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            LocalStore::open(dir.path().join("offline.db"))
                .await
                .unwrap(),
        );
        Self::assemble(endpoint, online, Some(store), Some(dir))
    }

    /// Engine reusing an existing store (restart simulation)
    pub fn with_store(endpoint: ScriptedEndpoint, online: bool, store: Arc<LocalStore>) -> Self {
        Self::assemble(endpoint, online, Some(store), None)
    }

    fn assemble(
        endpoint: ScriptedEndpoint,
        online: bool,
        store: Option<Arc<LocalStore>>,
        dir: Option<tempfile::TempDir>,
    ) -> Self {
        init_tracing();
        let endpoint = Arc::new(endpoint);
        let monitor = Arc::new(ConnectivityMonitor::new(online));
        let queue = Arc::new(OutboundQueue::new(store.clone()));
        let pipeline = Arc::new(MessagePipeline::new(
            store.clone(),
            monitor.clone(),
            endpoint.clone(),
            queue.clone(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            queue.clone(),
            endpoint.clone(),
            pipeline.clone(),
            monitor.clone(),
            3,
        ));
        Self {
            endpoint,
            monitor,
            store,
            queue,
            pipeline,
            coordinator,
            _dir: dir,
        }
    }
}

/// Poll until `check` yields true or the timeout elapses
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within timeout");
}
