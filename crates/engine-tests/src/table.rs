//! An in-memory source table that answers the same requests the MySQL
//! adapter renders to SQL, by evaluating the planned filter and ordering.

use async_trait::async_trait;
use connectors::{
    metadata::column::ColumnProperties,
    sql::base::{
        adapter::{MetadataProvider, RowSource, RowStream},
        error::DbError,
        requests::FetchRowsRequest,
    },
};
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use planner::query::ast::{common::OrderDir, expr::Expr};
use std::{cmp::Ordering, sync::Mutex};

#[derive(Default)]
struct TableState {
    rows: Vec<RowData>,
    /// Rows that become visible once more than `after` fetches have run.
    scheduled: Vec<(usize, RowData)>,
    fetch_calls: usize,
    fail_fetch_call: Option<usize>,
    fail_metadata: bool,
    requests: Vec<FetchRowsRequest>,
}

pub struct InMemoryTable {
    pub database: String,
    pub table: String,
    columns: Vec<ColumnProperties>,
    state: Mutex<TableState>,
}

impl InMemoryTable {
    pub fn new(database: &str, table: &str, columns: Vec<ColumnProperties>) -> Self {
        Self {
            database: database.to_string(),
            table: table.to_string(),
            columns,
            state: Mutex::new(TableState::default()),
        }
    }

    /// Table whose `keys` are auto-incrementing integers.
    pub fn auto_increment(database: &str, table: &str, keys: &[&str]) -> Self {
        let columns = keys
            .iter()
            .map(|k| ColumnProperties::new(*k, "int", true))
            .collect();
        Self::new(database, table, columns)
    }

    pub fn insert(&self, row: RowData) {
        self.state.lock().unwrap().rows.push(row);
    }

    pub fn insert_all(&self, rows: impl IntoIterator<Item = RowData>) {
        self.state.lock().unwrap().rows.extend(rows);
    }

    /// Makes `row` visible to every fetch after the first `after` fetches.
    pub fn insert_after_fetches(&self, after: usize, row: RowData) {
        self.state.lock().unwrap().scheduled.push((after, row));
    }

    /// The `call`-th fetch (1-based, counted over the table's lifetime)
    /// fails once.
    pub fn fail_fetch_call(&self, call: usize) {
        self.state.lock().unwrap().fail_fetch_call = Some(call);
    }

    pub fn fail_metadata(&self, fail: bool) {
        self.state.lock().unwrap().fail_metadata = fail;
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn requests(&self) -> Vec<FetchRowsRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    fn answer(&self, request: FetchRowsRequest) -> Result<Vec<RowData>, DbError> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        let call = state.fetch_calls;
        state.requests.push(request.clone());

        let (visible, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.scheduled)
            .into_iter()
            .partition(|(after, _)| call > *after);
        state.scheduled = pending;
        state.rows.extend(visible.into_iter().map(|(_, row)| row));

        if state.fail_fetch_call == Some(call) {
            state.fail_fetch_call = None;
            return Err(DbError::Unknown(format!("injected failure on fetch {call}")));
        }

        let mut rows: Vec<RowData> = state
            .rows
            .iter()
            .filter(|row| request.predicate.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_rows(a, b, &request));
        if let Some(limit) = request.limit {
            rows.truncate(limit);
        }

        Ok(rows
            .into_iter()
            .map(|row| project(&row, &request.columns))
            .collect())
    }
}

fn compare_rows(a: &RowData, b: &RowData, request: &FetchRowsRequest) -> Ordering {
    for order in &request.predicate.ordering {
        let Expr::Identifier(ident) = &order.expr else {
            continue;
        };
        let ord = a
            .get_value(&ident.name)
            .compare(&b.get_value(&ident.name))
            .unwrap_or(Ordering::Equal);
        let ord = match order.direction {
            Some(OrderDir::Desc) => ord.reverse(),
            _ => ord,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn project(row: &RowData, columns: &[String]) -> RowData {
    let fields = columns
        .iter()
        .filter_map(|c| row.get(c).cloned())
        .collect::<Vec<FieldValue>>();
    RowData::new(&row.entity, fields)
}

#[async_trait]
impl MetadataProvider for InMemoryTable {
    async fn column_properties(
        &self,
        database: &str,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<ColumnProperties>, DbError> {
        if self.state.lock().unwrap().fail_metadata {
            return Err(DbError::Unknown("information_schema unavailable".into()));
        }
        if database != self.database || table != self.table {
            return Ok(Vec::new());
        }
        Ok(self
            .columns
            .iter()
            .filter(|p| columns.iter().any(|c| c.eq_ignore_ascii_case(&p.name)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RowSource for InMemoryTable {
    fn fetch_rows(&self, request: FetchRowsRequest) -> RowStream<'_> {
        let results: Vec<Result<RowData, DbError>> = match self.answer(request) {
            Ok(rows) => rows.into_iter().map(Ok).collect(),
            Err(err) => vec![Err(err)],
        };
        Box::pin(futures::stream::iter(results))
    }
}

/// A row of integer columns.
pub fn int_row(table: &str, fields: &[(&str, i64)]) -> RowData {
    RowData::new(
        table,
        fields
            .iter()
            .map(|(name, v)| FieldValue::new(*name, Value::Int(*v)))
            .collect(),
    )
}

/// Rows `id = 1..=n` with a derived `total` column.
pub fn id_rows(table: &str, n: i64) -> Vec<RowData> {
    (1..=n)
        .map(|id| int_row(table, &[("id", id), ("total", id * 10)]))
        .collect()
}
