use crate::table::InMemoryTable;
use async_trait::async_trait;
use engine_core::{
    connectors::sink::{MemorySink, Sink},
    error::{SinkError, StateStoreError},
    state::{BookmarkStore, CheckpointEntry, memory::InMemoryBookmarkStore},
    version::SequentialVersions,
};
use engine_processing::full_table::{SyncCoordinator, SyncSettings};
use model::{
    core::identifiers::{StreamId, Version},
    events::sync::SyncMessage,
    state::bookmark::Bookmark,
    stream::Stream,
};
use serde_json::Value as JsonValue;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

pub const DATABASE: &str = "shop";
pub const TABLE: &str = "orders";
pub const STREAM_ID: &str = "shop-orders";

/// The `orders` stream keyed on `id`, projecting `total`.
pub fn orders_stream() -> Stream {
    Stream::new(
        STREAM_ID,
        DATABASE,
        TABLE,
        vec!["id".into()],
        vec!["id".into(), "total".into()],
    )
}

/// Shared collaborators that outlive individual (possibly crashed) runs.
pub struct Harness {
    pub table: Arc<InMemoryTable>,
    pub store: Arc<dyn BookmarkStore>,
    pub versions: Arc<SequentialVersions>,
    pub batch_size: usize,
}

impl Harness {
    pub fn new(table: InMemoryTable, batch_size: usize) -> Self {
        Self::with_store(table, Arc::new(InMemoryBookmarkStore::new()), batch_size)
    }

    pub fn with_store(table: InMemoryTable, store: Arc<dyn BookmarkStore>, batch_size: usize) -> Self {
        Self {
            table: Arc::new(table),
            store,
            versions: Arc::new(SequentialVersions::starting_at(100)),
            batch_size,
        }
    }

    pub fn coordinator(&self, sink: Arc<dyn Sink>) -> SyncCoordinator {
        self.coordinator_with_store(sink, self.store.clone())
    }

    pub fn coordinator_with_store(
        &self,
        sink: Arc<dyn Sink>,
        store: Arc<dyn BookmarkStore>,
    ) -> SyncCoordinator {
        SyncCoordinator::new(
            self.table.clone(),
            self.table.clone(),
            store,
            self.versions.clone(),
            sink,
            SyncSettings::default().with_batch_size(self.batch_size),
        )
    }

    pub async fn bookmark(&self, stream: &StreamId) -> Bookmark {
        let raw = self
            .store
            .load_bookmark(stream)
            .await
            .expect("load bookmark")
            .unwrap_or(JsonValue::Null);
        Bookmark::load(&raw).bookmark
    }

    pub async fn checkpoints(&self, stream: &StreamId) -> Vec<CheckpointEntry> {
        self.store.checkpoints(stream).await.expect("checkpoints")
    }
}

/// Delivers to an inner [`MemorySink`] until the `fail_at`-th record
/// (1-based), which is rejected without being delivered.
pub struct CrashingSink {
    pub inner: MemorySink,
    records: AtomicUsize,
    fail_at: usize,
}

impl CrashingSink {
    pub fn new(fail_at: usize) -> Self {
        Self {
            inner: MemorySink::new(),
            records: AtomicUsize::new(0),
            fail_at,
        }
    }
}

#[async_trait]
impl Sink for CrashingSink {
    async fn emit(&self, message: SyncMessage) -> Result<(), SinkError> {
        if matches!(message, SyncMessage::Record { .. })
            && self.records.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at
        {
            return Err(SinkError::Rejected("simulated crash".into()));
        }
        self.inner.emit(message).await
    }
}

/// Passes through to a shared store until the `fail_at`-th save (1-based).
pub struct FlakyStore {
    inner: Arc<dyn BookmarkStore>,
    saves: AtomicUsize,
    fail_at: usize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn BookmarkStore>, fail_at: usize) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
            fail_at,
        }
    }
}

#[async_trait]
impl BookmarkStore for FlakyStore {
    async fn load_bookmark(&self, stream: &StreamId) -> Result<Option<JsonValue>, StateStoreError> {
        self.inner.load_bookmark(stream).await
    }

    async fn save_bookmark(
        &self,
        stream: &StreamId,
        bookmark: &Bookmark,
    ) -> Result<(), StateStoreError> {
        if self.saves.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at {
            return Err(StateStoreError::Storage(sled::Error::Unsupported(
                "simulated crash".into(),
            )));
        }
        self.inner.save_bookmark(stream, bookmark).await
    }

    async fn checkpoints(&self, stream: &StreamId) -> Result<Vec<CheckpointEntry>, StateStoreError> {
        self.inner.checkpoints(stream).await
    }

    async fn reset(&self, stream: &StreamId) -> Result<(), StateStoreError> {
        self.inner.reset(stream).await
    }
}

/// Values of integer column `column` across all record messages, in order.
pub fn record_values(messages: &[SyncMessage], column: &str) -> Vec<i64> {
    messages
        .iter()
        .filter_map(|m| match m {
            SyncMessage::Record { row, .. } => row.get_value(column).as_i64(),
            _ => None,
        })
        .collect()
}

/// Versions named by activation signals, in order.
pub fn activations(messages: &[SyncMessage]) -> Vec<Version> {
    messages
        .iter()
        .filter_map(|m| match m {
            SyncMessage::ActivateVersion { version, .. } => Some(*version),
            _ => None,
        })
        .collect()
}

/// Message kinds in delivery order, e.g. `["ACTIVATE_VERSION", "RECORD", ..]`.
pub fn message_types(messages: &[SyncMessage]) -> Vec<&'static str> {
    messages.iter().map(SyncMessage::message_type).collect()
}
