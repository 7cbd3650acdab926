use planner::error::PlanError;
use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any MySQL driver error, including connection setup.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// The query could not be planned (bad identifier, incomplete key tuple).
    #[error("Query build error: {0}")]
    Plan(#[from] PlanError),

    /// A column the caller depends on was not present in a fetched row.
    #[error("Column `{column}` missing from `{table}`")]
    MissingColumn { table: String, column: String },

    /// The driver returned a value this engine cannot represent.
    #[error("Unsupported value in column `{column}`: {detail}")]
    UnsupportedType { column: String, detail: String },

    #[error("Unknown error: {0}")]
    Unknown(String),
}
