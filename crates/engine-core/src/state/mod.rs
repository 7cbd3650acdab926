use crate::error::StateStoreError;
use async_trait::async_trait;
use model::{core::identifiers::StreamId, state::bookmark::Bookmark};
use serde_json::Value as JsonValue;

pub mod memory;
pub mod models;
pub mod sled_store;

pub use models::CheckpointEntry;

/// Durable per-stream bookmark persistence.
///
/// Stores make no attempt at concurrency control between writers of the
/// same stream; callers must run at most one attempt per stream.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// The bookmark exactly as last persisted, before any whitelisting.
    async fn load_bookmark(&self, stream: &StreamId) -> Result<Option<JsonValue>, StateStoreError>;

    /// Atomically replaces the stream's bookmark and appends it to the
    /// stream's checkpoint log. Returns once the write is durable.
    async fn save_bookmark(&self, stream: &StreamId, bookmark: &Bookmark)
    -> Result<(), StateStoreError>;

    /// The stream's checkpoint log, oldest first.
    async fn checkpoints(&self, stream: &StreamId) -> Result<Vec<CheckpointEntry>, StateStoreError>;

    /// Forgets the stream's bookmark so the next attempt starts fresh. The
    /// checkpoint log is kept.
    async fn reset(&self, stream: &StreamId) -> Result<(), StateStoreError>;
}
