use crate::{
    error::StateStoreError,
    state::{BookmarkStore, models::CheckpointEntry},
};
use async_trait::async_trait;
use model::{core::identifiers::StreamId, state::bookmark::Bookmark};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    bookmarks: HashMap<StreamId, JsonValue>,
    log: Vec<CheckpointEntry>,
}

/// Process-local bookmark store. Survives nothing but a dropped sync
/// future, which is what crash-and-resume tests need.
#[derive(Default)]
pub struct InMemoryBookmarkStore {
    inner: Mutex<Inner>,
}

impl InMemoryBookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `raw` verbatim, bypassing serialization of a [`Bookmark`].
    pub async fn put_raw(&self, stream: &StreamId, raw: JsonValue) {
        self.inner.lock().await.bookmarks.insert(stream.clone(), raw);
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBookmarkStore {
    async fn load_bookmark(&self, stream: &StreamId) -> Result<Option<JsonValue>, StateStoreError> {
        Ok(self.inner.lock().await.bookmarks.get(stream).cloned())
    }

    async fn save_bookmark(
        &self,
        stream: &StreamId,
        bookmark: &Bookmark,
    ) -> Result<(), StateStoreError> {
        let mut inner = self.inner.lock().await;
        let seq = inner.log.len() as u64;
        let entry = CheckpointEntry::new(stream.as_str(), seq, bookmark)?;
        inner.bookmarks.insert(stream.clone(), bookmark.to_json());
        inner.log.push(entry);
        Ok(())
    }

    async fn checkpoints(&self, stream: &StreamId) -> Result<Vec<CheckpointEntry>, StateStoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .log
            .iter()
            .filter(|e| e.stream == stream.as_str())
            .cloned()
            .collect())
    }

    async fn reset(&self, stream: &StreamId) -> Result<(), StateStoreError> {
        self.inner.lock().await.bookmarks.remove(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::identifiers::Version;
    use serde_json::json;

    #[tokio::test]
    async fn raw_values_are_returned_unfiltered() {
        let store = InMemoryBookmarkStore::new();
        let stream = StreamId::new("s");
        store
            .put_raw(&stream, json!({"version": 3, "stale": true}))
            .await;

        let raw = store.load_bookmark(&stream).await.unwrap().unwrap();
        assert_eq!(raw["stale"], json!(true));
        assert_eq!(Bookmark::load(&raw).bookmark.version(), Some(Version::new(3)));
    }

    #[tokio::test]
    async fn log_is_per_stream_and_ordered() {
        let store = InMemoryBookmarkStore::new();
        let a = StreamId::new("a");
        let b = StreamId::new("b");

        for v in 1..=3 {
            store
                .save_bookmark(&a, &Bookmark::default().with_version(Version::new(v)))
                .await
                .unwrap();
        }
        store
            .save_bookmark(&b, &Bookmark::default().with_version(Version::new(99)))
            .await
            .unwrap();

        let versions: Vec<_> = store
            .checkpoints(&a)
            .await
            .unwrap()
            .iter()
            .map(|e| e.bookmark().bookmark.version())
            .collect();
        assert_eq!(
            versions,
            vec![
                Some(Version::new(1)),
                Some(Version::new(2)),
                Some(Version::new(3))
            ]
        );
    }
}
