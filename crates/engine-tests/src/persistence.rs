#[cfg(test)]
mod tests {
    use crate::{
        table::{InMemoryTable, id_rows},
        utils::{CrashingSink, DATABASE, Harness, TABLE, orders_stream, record_values},
    };
    use engine_core::{
        connectors::sink::MemorySink,
        state::{BookmarkStore, sled_store::SledBookmarkStore},
    };
    use model::core::{identifiers::Version, value::Value};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn sled_harness(dir: &std::path::Path, rows: i64, batch_size: usize) -> Harness {
        let table = InMemoryTable::auto_increment(DATABASE, TABLE, &["id"]);
        table.insert_all(id_rows(TABLE, rows));
        let store = Arc::new(SledBookmarkStore::open(dir).unwrap());
        Harness::with_store(table, store, batch_size)
    }

    // Scenario: A sled-backed sync crashes on row 4 of 5 and is run again.
    // Expected Outcome: The checkpoint log records the boundary, one cursor
    // per delivered row in key order, and the completion, all under one
    // version with strictly increasing sequence numbers.
    #[traced_test]
    #[tokio::test]
    async fn checkpoint_log_traces_crash_and_resume() {
        let dir = tempdir().unwrap();
        let harness = sled_harness(dir.path(), 5, 2);
        let stream = orders_stream();

        let crashing = Arc::new(CrashingSink::new(4));
        assert!(harness.coordinator(crashing.clone()).run(&stream).await.is_err());
        assert_eq!(record_values(&crashing.inner.messages().await, "id"), vec![1, 2, 3]);

        let sink = Arc::new(MemorySink::new());
        let report = harness.coordinator(sink.clone()).run(&stream).await.unwrap();
        assert!(report.resumed);
        assert_eq!(record_values(&sink.messages().await, "id"), vec![4, 5]);

        let entries = harness.checkpoints(&stream.id).await;
        assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(entries.iter().all(|e| e.stream == stream.id.as_str()));

        let bookmarks: Vec<_> = entries.iter().map(|e| e.bookmark().bookmark).collect();
        assert!(bookmarks.iter().all(|b| b.version() == Some(Version::new(100))));

        let cursors: Vec<Option<i64>> = bookmarks
            .iter()
            .map(|b| b.last_pk_fetched().and_then(|k| k.get("id")).and_then(Value::as_i64))
            .collect();
        assert_eq!(
            cursors,
            vec![None, Some(1), Some(2), Some(3), Some(4), Some(5), None]
        );

        let last = bookmarks.last().unwrap();
        assert!(last.initial_full_table_complete());
        assert!(last.max_pk_values().is_none());
    }

    // Scenario: A completed stream's bookmark is reset and the stream synced
    // again.
    // Expected Outcome: The next run is a fresh attempt under a new version
    // while the earlier checkpoint history stays readable.
    #[tokio::test]
    async fn reset_forces_fresh_attempt_and_keeps_history() {
        let dir = tempdir().unwrap();
        let harness = sled_harness(dir.path(), 3, 10);
        let stream = orders_stream();

        harness
            .coordinator(Arc::new(MemorySink::new()))
            .run(&stream)
            .await
            .unwrap();
        let history = harness.checkpoints(&stream.id).await.len();

        harness.store.reset(&stream.id).await.unwrap();
        assert!(harness.store.load_bookmark(&stream.id).await.unwrap().is_none());

        let report = harness
            .coordinator(Arc::new(MemorySink::new()))
            .run(&stream)
            .await
            .unwrap();
        assert!(!report.resumed);
        assert_eq!(report.version, Version::new(101));

        let entries = harness.checkpoints(&stream.id).await;
        assert_eq!(entries.len(), history * 2);
        assert_eq!(entries[0].bookmark().bookmark.version(), Some(Version::new(100)));
    }
}
