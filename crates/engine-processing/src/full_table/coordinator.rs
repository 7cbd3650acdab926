use crate::{
    error::SyncError,
    full_table::{
        boundary::SnapshotBoundary, config::SyncSettings, probe::SchemaProbe,
    },
};
use chrono::Utc;
use connectors::sql::base::{
    adapter::{MetadataProvider, RowSource},
    error::DbError,
    requests::FetchRowsRequestBuilder,
};
use engine_core::{connectors::sink::Sink, state::BookmarkStore, version::VersionGenerator};
use futures::TryStreamExt;
use model::{
    core::identifiers::{StreamId, Version},
    events::sync::SyncMessage,
    records::{key::KeyValues, row::RowData},
    state::bookmark::Bookmark,
    stream::Stream,
};
use planner::query::{ident::validate_stream, offsets::KeysetOffset};
use serde_json::Value as JsonValue;
use std::{cmp::Ordering, fmt, sync::Arc};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Keyset pages under a snapshot boundary, checkpointed per row.
    Paginated,
    /// One unordered pass with no checkpoints.
    SinglePass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    NotStarted,
    ActivationPending,
    Streaming,
    Completed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::NotStarted => "not_started",
            SyncPhase::ActivationPending => "activation_pending",
            SyncPhase::Streaming => "streaming",
            SyncPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Outcome of one completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub stream: StreamId,
    pub mode: SyncMode,
    pub resumed: bool,
    pub rows_emitted: u64,
    pub version: Version,
}

/// Drives one stream through a full-table attempt.
///
/// Every collaborator failure aborts the attempt. Nothing is retried here;
/// the next run resumes from the last persisted checkpoint.
pub struct SyncCoordinator {
    metadata: Arc<dyn MetadataProvider>,
    source: Arc<dyn RowSource>,
    store: Arc<dyn BookmarkStore>,
    versions: Arc<dyn VersionGenerator>,
    sink: Arc<dyn Sink>,
    settings: SyncSettings,
}

/// Per-attempt state threaded through the phases.
struct Attempt<'s> {
    stream: &'s Stream,
    bookmark: Bookmark,
    version: Version,
    resumed: bool,
    rows_emitted: u64,
    phase: SyncPhase,
}

impl Attempt<'_> {
    fn enter(&mut self, phase: SyncPhase) {
        debug!(stream = %self.stream.id, from = %self.phase, to = %phase, "Sync phase");
        self.phase = phase;
    }
}

impl SyncCoordinator {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        source: Arc<dyn RowSource>,
        store: Arc<dyn BookmarkStore>,
        versions: Arc<dyn VersionGenerator>,
        sink: Arc<dyn Sink>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            metadata,
            source,
            store,
            versions,
            sink,
            settings,
        }
    }

    pub async fn run(&self, stream: &Stream) -> Result<SyncReport, SyncError> {
        self.settings.validate(&stream.id)?;
        validate_stream(stream)?;
        if stream.require_pagination && !stream.has_keys() {
            return Err(SyncError::configuration(
                &stream.id,
                "pagination is required but the stream has no key columns",
            ));
        }

        let bookmark = self.load_bookmark(stream).await?;
        let resumed = self.is_resumable(stream, &bookmark);

        let paginated = SchemaProbe::new(self.metadata.as_ref())
            .detect_ordered_pagination(stream)
            .await;
        if paginated {
            info!(
                stream = %stream.id,
                "Detected auto-incrementing primary key(s) - will replicate incrementally"
            );
        } else if stream.require_pagination {
            return Err(SyncError::configuration(
                &stream.id,
                "pagination is required but the key columns are not auto-incrementing",
            ));
        } else {
            info!(
                stream = %stream.id,
                "No auto-incrementing primary key(s) - will replicate the full table in one pass"
            );
        }

        let (bookmark, version) = match bookmark.version() {
            Some(version) if resumed => {
                info!(stream = %stream.id, version = %version, "Resuming interrupted full-table sync");
                (bookmark, version)
            }
            _ => self.start_fresh(stream, &bookmark).await?,
        };
        // A single pass cannot continue from a cursor, so it never counts as resumed.
        let mut attempt = Attempt {
            stream,
            bookmark,
            version,
            resumed: resumed && paginated,
            rows_emitted: 0,
            phase: SyncPhase::NotStarted,
        };
        attempt.enter(SyncPhase::ActivationPending);

        // ActivationPending -> Streaming
        attempt.enter(SyncPhase::Streaming);
        let mode = if paginated {
            self.stream_pages(&mut attempt).await?;
            SyncMode::Paginated
        } else {
            if attempt.bookmark.is_in_progress() {
                warn!(
                    stream = %stream.id,
                    "Interrupted keyset scan can no longer paginate; rescanning the whole table"
                );
            }
            self.stream_single_pass(&mut attempt).await?;
            SyncMode::SinglePass
        };

        // Streaming -> Completed
        self.complete(&mut attempt).await?;

        Ok(SyncReport {
            stream: stream.id.clone(),
            mode,
            resumed: attempt.resumed,
            rows_emitted: attempt.rows_emitted,
            version: attempt.version,
        })
    }

    async fn load_bookmark(&self, stream: &Stream) -> Result<Bookmark, SyncError> {
        let raw = self.store.load_bookmark(&stream.id).await?;
        let loaded = Bookmark::load(&raw.unwrap_or(JsonValue::Null));
        for repair in &loaded.repairs {
            warn!(stream = %stream.id, repair = %repair, "Repaired persisted bookmark");
        }
        Ok(loaded.bookmark)
    }

    /// An attempt resumes only if the bookmark carries a version and a
    /// boundary (plus cursor, if any) that cover the stream's current keys.
    fn is_resumable(&self, stream: &Stream, bookmark: &Bookmark) -> bool {
        if !bookmark.is_in_progress() {
            return false;
        }
        let covers = |keys: Option<&KeyValues>| keys.is_none_or(|k| k.covers(&stream.key_columns));
        if covers(bookmark.max_pk_values()) && covers(bookmark.last_pk_fetched()) {
            return true;
        }
        warn!(
            stream = %stream.id,
            keys = ?stream.key_columns,
            "Bookmark key tuple does not match the stream's keys; starting fresh"
        );
        false
    }

    /// Assigns a new version and sends the pre-emptive activation signal.
    /// The version reaches the store with the first checkpoint, so a failed
    /// boundary capture leaves the persisted bookmark untouched.
    async fn start_fresh(
        &self,
        stream: &Stream,
        bookmark: &Bookmark,
    ) -> Result<(Bookmark, Version), SyncError> {
        let version = self.versions.next_version();
        let bookmark = bookmark.fresh_attempt(version);

        info!(stream = %stream.id, version = %version, "Starting fresh full-table sync");
        self.sink
            .emit(SyncMessage::ActivateVersion {
                stream: stream.id.clone(),
                version,
            })
            .await?;
        Ok((bookmark, version))
    }

    async fn stream_pages(&self, attempt: &mut Attempt<'_>) -> Result<(), SyncError> {
        let stream = attempt.stream;
        let offset = KeysetOffset::for_stream(stream)?;

        let boundary = match attempt.bookmark.max_pk_values() {
            Some(boundary) => boundary.clone(),
            None => {
                let captured = SnapshotBoundary::new(self.source.as_ref())
                    .capture(stream, &offset)
                    .await?;
                let Some(boundary) = captured else {
                    return Ok(());
                };
                attempt.bookmark = attempt.bookmark.with_max_pk_values(boundary.clone());
                self.store.save_bookmark(&stream.id, &attempt.bookmark).await?;
                boundary
            }
        };

        let mut cursor = attempt.bookmark.last_pk_fetched().cloned();
        loop {
            let predicate = offset.build_predicate(Some(&boundary), cursor.as_ref())?;
            let request = FetchRowsRequestBuilder::for_stream(stream)
                .predicate(predicate)
                .limit(self.settings.batch_size)
                .build();

            let mut page_rows = 0u64;
            let mut rows = self.source.fetch_rows(request);
            while let Some(row) = rows
                .try_next()
                .await
                .map_err(|e| SyncError::row_source(&stream.id, e))?
            {
                let key = next_key(stream, &offset, &row, cursor.as_ref())?;
                self.emit_record(attempt, row).await?;

                // Checkpoint only after the sink has the row.
                attempt.bookmark = attempt.bookmark.with_last_pk_fetched(key.clone());
                self.store.save_bookmark(&stream.id, &attempt.bookmark).await?;
                cursor = Some(key);
                page_rows += 1;
            }
            drop(rows);

            if page_rows == 0 {
                return Ok(());
            }
            debug!(stream = %stream.id, rows = page_rows, cursor = ?cursor, "Page consumed");
            self.emit_state(attempt).await?;
        }
    }

    async fn stream_single_pass(&self, attempt: &mut Attempt<'_>) -> Result<(), SyncError> {
        let stream = attempt.stream;
        let request = FetchRowsRequestBuilder::for_stream(stream).build();

        let mut rows = self.source.fetch_rows(request);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| SyncError::row_source(&stream.id, e))?
        {
            self.emit_record(attempt, row).await?;
        }
        Ok(())
    }

    async fn complete(&self, attempt: &mut Attempt<'_>) -> Result<(), SyncError> {
        let stream = attempt.stream;
        attempt.bookmark = attempt.bookmark.completed();
        self.store.save_bookmark(&stream.id, &attempt.bookmark).await?;
        self.emit_state(attempt).await?;

        self.sink
            .emit(SyncMessage::ActivateVersion {
                stream: stream.id.clone(),
                version: attempt.version,
            })
            .await?;
        attempt.enter(SyncPhase::Completed);

        info!(
            stream = %stream.id,
            version = %attempt.version,
            rows = attempt.rows_emitted,
            resumed = attempt.resumed,
            "Full-table sync complete"
        );
        Ok(())
    }

    async fn emit_record(&self, attempt: &mut Attempt<'_>, row: RowData) -> Result<(), SyncError> {
        trace!(stream = %attempt.stream.id, "Emitting record");
        self.sink
            .emit(SyncMessage::Record {
                stream: attempt.stream.id.clone(),
                version: attempt.version,
                row,
                time_extracted: Utc::now(),
            })
            .await?;
        attempt.rows_emitted += 1;
        Ok(())
    }

    async fn emit_state(&self, attempt: &Attempt<'_>) -> Result<(), SyncError> {
        self.sink
            .emit(SyncMessage::State {
                stream: attempt.stream.id.clone(),
                bookmark: attempt.bookmark.clone(),
            })
            .await?;
        Ok(())
    }
}

/// Key tuple of `row`, which must sort strictly after the previous cursor.
fn next_key(
    stream: &Stream,
    offset: &KeysetOffset,
    row: &RowData,
    cursor: Option<&KeyValues>,
) -> Result<KeyValues, SyncError> {
    let key = offset.next_cursor(row).ok_or_else(|| {
        SyncError::row_source(
            &stream.id,
            DbError::MissingColumn {
                table: stream.table.clone(),
                column: offset.key_columns().join(", "),
            },
        )
    })?;

    if let Some(previous) = cursor
        && key.compare(previous, offset.key_columns()) != Some(Ordering::Greater)
    {
        return Err(SyncError::row_source(
            &stream.id,
            DbError::Unknown(format!(
                "row key {key:?} does not advance past cursor {previous:?}"
            )),
        ));
    }
    Ok(key)
}
