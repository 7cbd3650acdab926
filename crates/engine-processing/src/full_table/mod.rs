//! Resumable full-table extraction.
//!
//! A stream is either scanned in keyset pages bounded by a snapshot boundary
//! and checkpointed after every row, or, when its keys cannot be paginated
//! safely, read in one unordered pass with no checkpoints. A crash during a
//! single pass restarts the table from the beginning on the next run.

pub mod boundary;
pub mod config;
pub mod coordinator;
pub mod probe;

pub use boundary::SnapshotBoundary;
pub use config::SyncSettings;
pub use coordinator::{SyncCoordinator, SyncMode, SyncPhase, SyncReport};
pub use probe::SchemaProbe;
