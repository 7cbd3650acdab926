use crate::error::SyncError;
use connectors::sql::base::{
    adapter::RowSource, error::DbError, requests::FetchRowsRequestBuilder,
};
use model::{records::key::KeyValues, stream::Stream};
use planner::query::offsets::KeysetOffset;
use tracing::info;

/// Captures the upper key bound for one paginated attempt.
pub struct SnapshotBoundary<'a> {
    source: &'a dyn RowSource,
}

impl<'a> SnapshotBoundary<'a> {
    pub fn new(source: &'a dyn RowSource) -> Self {
        Self { source }
    }

    /// Key tuple of the single greatest row under descending key order, or
    /// `None` for an empty table. The tuple comes from one real row, never
    /// from independent per-column maxima.
    pub async fn capture(
        &self,
        stream: &Stream,
        offset: &KeysetOffset,
    ) -> Result<Option<KeyValues>, SyncError> {
        let request = FetchRowsRequestBuilder::new(&stream.database, &stream.table)
            .columns(offset.key_columns().to_vec())
            .predicate(offset.boundary_predicate())
            .limit(1)
            .build();

        let row = self
            .source
            .fetch_one(request)
            .await
            .map_err(|source| SyncError::SnapshotCapture {
                stream: stream.id.clone(),
                source,
            })?;

        let Some(row) = row else {
            info!(stream = %stream.id, "Table is empty; nothing to scan");
            return Ok(None);
        };

        let boundary = offset.next_cursor(&row).ok_or_else(|| SyncError::SnapshotCapture {
            stream: stream.id.clone(),
            source: DbError::MissingColumn {
                table: stream.table.clone(),
                column: offset.key_columns().join(", "),
            },
        })?;

        info!(stream = %stream.id, boundary = ?boundary, "Captured snapshot boundary");
        Ok(Some(boundary))
    }
}
