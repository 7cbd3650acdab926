//! Allow-list for identifiers that end up in generated SQL.
//!
//! Values are always bound as parameters; identifiers cannot be, so every
//! schema, table and column name is checked here before it reaches a
//! renderer.

use crate::error::PlanError;
use model::stream::Stream;

/// Longest identifier accepted by either supported dialect (MySQL: 64).
pub const MAX_IDENTIFIER_LEN: usize = 64;

pub fn validate_identifier(name: &str) -> Result<&str, PlanError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if valid {
        Ok(name)
    } else {
        Err(PlanError::InvalidIdentifier(name.to_string()))
    }
}

/// Checks every identifier a stream contributes to its queries.
pub fn validate_stream(stream: &Stream) -> Result<(), PlanError> {
    validate_identifier(&stream.database)?;
    validate_identifier(&stream.table)?;
    for column in stream.columns.iter().chain(stream.key_columns.iter()) {
        validate_identifier(column)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for name in ["id", "order_items", "Col$1", "2fa_secret"] {
            assert_eq!(validate_identifier(name), Ok(name));
        }
    }

    #[test]
    fn rejects_anything_that_could_escape_quoting() {
        for name in ["", "a b", "id`; DROP", "x\"", "t.col", "naïve"] {
            assert_eq!(
                validate_identifier(name),
                Err(PlanError::InvalidIdentifier(name.to_string()))
            );
        }
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[test]
    fn stream_validation_covers_keys() {
        let stream = Stream::new(
            "s",
            "shop",
            "orders",
            vec!["id; --".into()],
            vec!["id".into()],
        );
        assert_eq!(
            validate_stream(&stream),
            Err(PlanError::InvalidIdentifier("id; --".into()))
        );
    }
}
