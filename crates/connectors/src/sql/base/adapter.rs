use crate::{
    metadata::column::ColumnProperties,
    sql::base::{error::DbError, requests::FetchRowsRequest},
};
use async_trait::async_trait;
use futures_util::{Stream, TryStreamExt};
use model::records::row::RowData;
use std::pin::Pin;

/// Lazily fetched rows. Dropping the stream releases the underlying query.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<RowData, DbError>> + Send + 'a>>;

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Properties of the requested columns of `database.table`. Columns that
    /// do not exist are simply absent from the result.
    async fn column_properties(
        &self,
        database: &str,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<ColumnProperties>, DbError>;
}

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Rows matching `request`, in the request's ordering. Each call runs a
    /// new query.
    fn fetch_rows(&self, request: FetchRowsRequest) -> RowStream<'_>;

    /// First row of `request` under its ordering, if any.
    async fn fetch_one(&self, request: FetchRowsRequest) -> Result<Option<RowData>, DbError> {
        let mut rows = self.fetch_rows(request.with_limit(1));
        rows.try_next().await
    }
}
