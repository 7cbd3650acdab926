use connectors::sql::base::adapter::MetadataProvider;
use model::stream::Stream;
use tracing::{debug, warn};

/// Decides whether a stream's key columns support ordered keyset pagination.
pub struct SchemaProbe<'a> {
    metadata: &'a dyn MetadataProvider,
}

impl<'a> SchemaProbe<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self { metadata }
    }

    /// True only if the stream has keys and every key column exists and is
    /// an auto-incrementing integer. A failed lookup counts as false.
    pub async fn detect_ordered_pagination(&self, stream: &Stream) -> bool {
        if !stream.has_keys() {
            debug!(stream = %stream.id, "No key columns; ordered pagination unavailable");
            return false;
        }

        let properties = match self
            .metadata
            .column_properties(&stream.database, &stream.table, &stream.key_columns)
            .await
        {
            Ok(properties) => properties,
            Err(err) => {
                warn!(
                    stream = %stream.id,
                    error = %err,
                    "Key column metadata lookup failed; falling back to a single pass"
                );
                return false;
            }
        };

        stream.key_columns.iter().all(|key| {
            match properties.iter().find(|p| p.name.eq_ignore_ascii_case(key)) {
                Some(column) if column.supports_ordered_pagination() => true,
                Some(column) => {
                    debug!(
                        stream = %stream.id,
                        column = %key,
                        data_type = %column.data_type,
                        auto_increment = column.auto_increment,
                        "Key column is not an auto-incrementing integer"
                    );
                    false
                }
                None => {
                    debug!(stream = %stream.id, column = %key, "Key column not found");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::{metadata::column::ColumnProperties, sql::base::error::DbError};

    struct Catalog(Result<Vec<ColumnProperties>, String>);

    #[async_trait]
    impl MetadataProvider for Catalog {
        async fn column_properties(
            &self,
            _database: &str,
            _table: &str,
            _columns: &[String],
        ) -> Result<Vec<ColumnProperties>, DbError> {
            self.0.clone().map_err(DbError::Unknown)
        }
    }

    fn stream(keys: &[&str]) -> Stream {
        Stream::new(
            "s",
            "db",
            "t",
            keys.iter().map(|k| k.to_string()).collect(),
            vec![],
        )
    }

    fn auto(name: &str) -> ColumnProperties {
        ColumnProperties::new(name, "int", true)
    }

    #[tokio::test]
    async fn all_auto_increment_keys_qualify() {
        let catalog = Catalog(Ok(vec![auto("a"), auto("B")]));
        let probe = SchemaProbe::new(&catalog);
        assert!(probe.detect_ordered_pagination(&stream(&["a", "b"])).await);
    }

    #[tokio::test]
    async fn one_disqualified_or_missing_key_fails_all() {
        let catalog = Catalog(Ok(vec![auto("a"), ColumnProperties::new("b", "int", false)]));
        let probe = SchemaProbe::new(&catalog);
        assert!(!probe.detect_ordered_pagination(&stream(&["a", "b"])).await);

        let catalog = Catalog(Ok(vec![auto("a")]));
        let probe = SchemaProbe::new(&catalog);
        assert!(!probe.detect_ordered_pagination(&stream(&["a", "b"])).await);
    }

    #[tokio::test]
    async fn keyless_streams_and_lookup_failures_degrade() {
        let catalog = Catalog(Ok(vec![auto("id")]));
        assert!(!SchemaProbe::new(&catalog).detect_ordered_pagination(&stream(&[])).await);

        let catalog = Catalog(Err("connection reset".into()));
        assert!(!SchemaProbe::new(&catalog).detect_ordered_pagination(&stream(&["id"])).await);
    }
}
