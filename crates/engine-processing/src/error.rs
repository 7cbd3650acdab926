use connectors::sql::base::error::DbError;
use engine_core::error::{SinkError, StateStoreError};
use model::core::identifiers::StreamId;
use planner::error::PlanError;
use thiserror::Error;

/// Failures that abort a sync attempt. The last durable checkpoint stays the
/// resume point for every variant.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The stream or settings cannot be synced as declared. Raised before any
    /// row is read or any bookmark is written.
    #[error("Invalid configuration for stream '{stream}': {reason}")]
    Configuration { stream: StreamId, reason: String },

    #[error("Failed to capture snapshot boundary for stream '{stream}': {source}")]
    SnapshotCapture {
        stream: StreamId,
        #[source]
        source: DbError,
    },

    #[error("Failed to read rows for stream '{stream}': {source}")]
    RowSource {
        stream: StreamId,
        #[source]
        source: DbError,
    },

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Bookmark store error: {0}")]
    State(#[from] StateStoreError),

    #[error("Query planning failed: {0}")]
    Plan(#[from] PlanError),
}

impl SyncError {
    pub fn configuration(stream: &StreamId, reason: impl Into<String>) -> Self {
        SyncError::Configuration {
            stream: stream.clone(),
            reason: reason.into(),
        }
    }

    pub fn row_source(stream: &StreamId, source: DbError) -> Self {
        SyncError::RowSource {
            stream: stream.clone(),
            source,
        }
    }
}
