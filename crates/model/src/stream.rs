use crate::core::identifiers::StreamId;
use serde::{Deserialize, Serialize};

/// Immutable descriptor of one source table being synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: StreamId,
    pub database: String,
    pub table: String,
    /// Ordered key columns; may be empty.
    #[serde(default)]
    pub key_columns: Vec<String>,
    pub columns: Vec<String>,
    /// Fail instead of degrading to a single unordered pass when keyset
    /// pagination is not possible.
    #[serde(default)]
    pub require_pagination: bool,
}

impl Stream {
    pub fn new(
        id: impl Into<StreamId>,
        database: &str,
        table: &str,
        key_columns: Vec<String>,
        columns: Vec<String>,
    ) -> Self {
        Stream {
            id: id.into(),
            database: database.to_string(),
            table: table.to_string(),
            key_columns,
            columns,
            require_pagination: false,
        }
    }

    pub fn with_require_pagination(mut self, required: bool) -> Self {
        self.require_pagination = required;
        self
    }

    pub fn has_keys(&self) -> bool {
        !self.key_columns.is_empty()
    }

    /// Projected columns with any missing key column appended, so every
    /// fetched row carries its full key tuple.
    pub fn projection(&self) -> Vec<String> {
        let mut columns = self.columns.clone();
        for key in &self.key_columns {
            if !columns.iter().any(|c| c.eq_ignore_ascii_case(key)) {
                columns.push(key.clone());
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_appends_missing_keys_once() {
        let stream = Stream::new(
            "db-orders",
            "db",
            "orders",
            vec!["id".into(), "region".into()],
            vec!["ID".into(), "total".into()],
        );
        assert_eq!(stream.projection(), vec!["ID", "total", "region"]);
    }

    #[test]
    fn deserializes_with_defaults() {
        let stream: Stream = serde_json::from_value(serde_json::json!({
            "id": "db-logs",
            "database": "db",
            "table": "logs",
            "columns": ["line"]
        }))
        .unwrap();
        assert!(!stream.has_keys());
        assert!(!stream.require_pagination);
    }
}
