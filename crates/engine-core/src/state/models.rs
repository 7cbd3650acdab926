use chrono::{DateTime, Utc};
use model::state::bookmark::{Bookmark, LoadedBookmark};
use serde::{Deserialize, Serialize};

/// One entry of a stream's append-only checkpoint log.
///
/// The bookmark is kept as JSON text: the log is bincode encoded and bincode
/// cannot represent the bookmark's optional fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckpointEntry {
    pub stream: String,
    pub seq: u64,
    pub bookmark: String,
    pub recorded_at: DateTime<Utc>,
}

impl CheckpointEntry {
    pub fn new(stream: &str, seq: u64, bookmark: &Bookmark) -> Result<Self, serde_json::Error> {
        Ok(CheckpointEntry {
            stream: stream.to_string(),
            seq,
            bookmark: serde_json::to_string(&bookmark.to_json())?,
            recorded_at: Utc::now(),
        })
    }

    /// Decodes the logged bookmark through the same whitelist as a live load.
    pub fn bookmark(&self) -> LoadedBookmark {
        let raw = serde_json::from_str(&self.bookmark)
            .unwrap_or_else(|_| serde_json::Value::String(self.bookmark.clone()));
        Bookmark::load(&raw)
    }
}
