use crate::state::bookmark::BookmarkField;
use thiserror::Error;

pub mod bookmark;

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Value {value} cannot be stored in bookmark field '{field}'")]
    TypeMismatch { field: BookmarkField, value: String },
}
