use crate::{
    error::StateStoreError,
    state::{BookmarkStore, models::CheckpointEntry},
};
use async_trait::async_trait;
use model::{core::identifiers::StreamId, state::bookmark::Bookmark};
use serde_json::Value as JsonValue;
use sled::transaction::TransactionError;
use std::path::Path;
use tracing::{trace, warn};

pub struct SledBookmarkStore {
    db: sled::Db,
}

impl SledBookmarkStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateStoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn bookmark_key(stream: &StreamId) -> String {
        format!("bm:{}", stream)
    }

    /// Length-prefixed so no stream id's prefix covers another id's log.
    #[inline]
    fn log_prefix(stream: &StreamId) -> String {
        format!("log:{}:{}:", stream.as_str().len(), stream)
    }

    /// Zero-padded so lexicographic key order matches append order.
    #[inline]
    fn log_key(stream: &StreamId, seq: u64) -> String {
        format!("{}{:020}", Self::log_prefix(stream), seq)
    }
}

#[async_trait]
impl BookmarkStore for SledBookmarkStore {
    async fn load_bookmark(&self, stream: &StreamId) -> Result<Option<JsonValue>, StateStoreError> {
        let Some(bytes) = self.db.get(Self::bookmark_key(stream))? else {
            return Ok(None);
        };

        // Unreadable bytes still load: the whitelist turns them into a default bookmark.
        let raw = serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            warn!(stream = %stream, error = %err, "Persisted bookmark is not valid JSON");
            JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
        });
        Ok(Some(raw))
    }

    async fn save_bookmark(
        &self,
        stream: &StreamId,
        bookmark: &Bookmark,
    ) -> Result<(), StateStoreError> {
        let seq = self.db.generate_id()?;
        let entry = CheckpointEntry::new(stream.as_str(), seq, bookmark)?;
        let bookmark_bytes = entry.bookmark.as_bytes().to_vec();
        let entry_bytes = bincode::serialize(&entry)?;

        let bookmark_key = Self::bookmark_key(stream);
        let log_key = Self::log_key(stream, seq);

        // Bookmark and log entry land together or not at all.
        let result = self
            .db
            .transaction::<_, _, StateStoreError>(|tx_db| {
                tx_db.insert(bookmark_key.as_bytes(), bookmark_bytes.as_slice())?;
                tx_db.insert(log_key.as_bytes(), entry_bytes.as_slice())?;
                Ok(())
            });

        match result {
            Ok(()) => {}
            Err(TransactionError::Abort(e)) => return Err(e),
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        }

        self.db.flush_async().await?;
        trace!(stream = %stream, seq, "Checkpoint persisted");
        Ok(())
    }

    async fn checkpoints(&self, stream: &StreamId) -> Result<Vec<CheckpointEntry>, StateStoreError> {
        let mut entries = Vec::new();
        for item in self.db.scan_prefix(Self::log_prefix(stream)) {
            let (_key, value) = item?;
            let entry: CheckpointEntry = bincode::deserialize(&value)?;
            if entry.stream == stream.as_str() {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn reset(&self, stream: &StreamId) -> Result<(), StateStoreError> {
        self.db.remove(Self::bookmark_key(stream))?;
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{core::identifiers::Version, core::value::Value, records::key::KeyValues};
    use tempfile::tempdir;

    fn keys(id: i64) -> KeyValues {
        [("id".to_string(), Value::Int(id))].into_iter().collect()
    }

    #[tokio::test]
    async fn save_replaces_bookmark_and_appends_log() {
        let dir = tempdir().unwrap();
        let store = SledBookmarkStore::open(dir.path()).unwrap();
        let stream = StreamId::new("shop-orders");

        let started = Bookmark::default()
            .with_version(Version::new(7))
            .with_max_pk_values(keys(5));
        let advanced = started.with_last_pk_fetched(keys(3));

        store.save_bookmark(&stream, &started).await.unwrap();
        store.save_bookmark(&stream, &advanced).await.unwrap();

        let raw = store.load_bookmark(&stream).await.unwrap().unwrap();
        assert_eq!(Bookmark::load(&raw).bookmark, advanced);

        let log = store.checkpoints(&stream).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].seq < log[1].seq);
        assert_eq!(log[0].bookmark().bookmark, started);
        assert_eq!(log[1].bookmark().bookmark, advanced);
    }

    #[tokio::test]
    async fn streams_are_independent() {
        let dir = tempdir().unwrap();
        let store = SledBookmarkStore::open(dir.path()).unwrap();
        let a = StreamId::new("a");
        let ab = StreamId::new("ab");

        store
            .save_bookmark(&a, &Bookmark::default().with_version(Version::new(1)))
            .await
            .unwrap();

        assert!(store.load_bookmark(&ab).await.unwrap().is_none());
        assert!(store.checkpoints(&ab).await.unwrap().is_empty());
        assert_eq!(store.checkpoints(&a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn logs_of_prefixed_stream_ids_stay_apart() {
        let dir = tempdir().unwrap();
        let store = SledBookmarkStore::open(dir.path()).unwrap();
        let a = StreamId::new("a");
        let a_b = StreamId::new("a:b");

        for stream in [&a, &a_b] {
            store
                .save_bookmark(stream, &Bookmark::default().with_version(Version::new(1)))
                .await
                .unwrap();
        }

        let log = store.checkpoints(&a).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].stream, "a");
        assert_eq!(store.checkpoints(&a_b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_forgets_bookmark_but_keeps_log() {
        let dir = tempdir().unwrap();
        let store = SledBookmarkStore::open(dir.path()).unwrap();
        let stream = StreamId::new("s");

        store
            .save_bookmark(&stream, &Bookmark::default().with_version(Version::new(1)))
            .await
            .unwrap();
        store.reset(&stream).await.unwrap();

        assert!(store.load_bookmark(&stream).await.unwrap().is_none());
        assert_eq!(store.checkpoints(&stream).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn garbage_bytes_load_as_non_object() {
        let dir = tempdir().unwrap();
        let store = SledBookmarkStore::open(dir.path()).unwrap();
        let stream = StreamId::new("s");
        store.db.insert("bm:s", &b"\xff{not json"[..]).unwrap();

        let raw = store.load_bookmark(&stream).await.unwrap().unwrap();
        let loaded = Bookmark::load(&raw);
        assert_eq!(loaded.bookmark, Bookmark::default());
        assert!(!loaded.repairs.is_empty());
    }
}
