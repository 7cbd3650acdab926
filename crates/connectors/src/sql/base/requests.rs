use model::{core::value::Value, stream::Stream};
use planner::{
    error::PlanError,
    query::{
        ast::{common::TableRef, select::Select},
        builder::select::SelectBuilder,
        ident,
        ident::validate_identifier,
        offsets::PagePredicate,
        value,
    },
};

/// One bounded read against a source table.
#[derive(Debug, Clone)]
pub struct FetchRowsRequest {
    pub database: String,
    pub table: String,
    pub columns: Vec<String>,
    pub predicate: PagePredicate,
    pub limit: Option<usize>,
}

impl FetchRowsRequest {
    /// Builds the `SELECT` for this request. Every identifier passes the
    /// allow-list; filter values stay bound parameters.
    pub fn to_select(&self) -> Result<Select, PlanError> {
        validate_identifier(&self.database)?;
        validate_identifier(&self.table)?;
        let columns = self
            .columns
            .iter()
            .map(|c| validate_identifier(c).map(ident))
            .collect::<Result<Vec<_>, _>>()?;

        let table = TableRef {
            schema: Some(self.database.clone()),
            name: self.table.clone(),
        };
        let mut builder = self
            .predicate
            .apply_to_builder(SelectBuilder::new().select(columns).from(table, None));

        if let Some(limit) = self.limit {
            builder = builder.limit(value(Value::Uint(limit as u64)));
        }

        Ok(builder.build())
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub struct FetchRowsRequestBuilder {
    database: String,
    table: String,
    columns: Vec<String>,
    predicate: PagePredicate,
    limit: Option<usize>,
}

impl FetchRowsRequestBuilder {
    pub fn new(database: &str, table: &str) -> Self {
        FetchRowsRequestBuilder {
            database: database.to_string(),
            table: table.to_string(),
            columns: Vec::new(),
            predicate: PagePredicate::unbounded(),
            limit: None,
        }
    }

    /// Starts a request projecting the stream's columns (keys included).
    pub fn for_stream(stream: &Stream) -> Self {
        Self::new(&stream.database, &stream.table).columns(stream.projection())
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn predicate(mut self, predicate: PagePredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> FetchRowsRequest {
        FetchRowsRequest {
            database: self.database,
            table: self.table,
            columns: self.columns,
            predicate: self.predicate,
            limit: self.limit,
        }
    }
}
