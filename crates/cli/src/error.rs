use connectors::sql::base::error::DbError;
use engine_core::error::StateStoreError;
use engine_processing::error::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Failed to deserialize the configuration file: {0}")]
    ConfigDeserialize(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Stream '{0}' is not defined in the configuration")]
    UnknownStream(String),

    #[error("Source error: {0}")]
    Source(#[from] DbError),

    #[error("Bookmark store error: {0}")]
    Store(#[from] StateStoreError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
