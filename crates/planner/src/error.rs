use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// An identifier failed the allow-list check and will not be rendered.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Keyset pagination needs at least one key column.
    #[error("Keyset pagination requires at least one key column")]
    EmptyKey,

    /// A cursor or boundary tuple lacks a value for a key column.
    #[error("Key tuple for '{tuple}' has no value for column '{column}'")]
    MissingKeyValue { tuple: &'static str, column: String },
}
