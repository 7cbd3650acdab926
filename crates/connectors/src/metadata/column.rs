/// Catalog facts about one column, as reported by a [`MetadataProvider`].
///
/// [`MetadataProvider`]: crate::sql::base::adapter::MetadataProvider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProperties {
    pub name: String,
    pub data_type: String,
    pub auto_increment: bool,
}

const INTEGER_TYPES: &[&str] = &[
    "tinyint",
    "smallint",
    "mediumint",
    "int",
    "integer",
    "bigint",
];

impl ColumnProperties {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, auto_increment: bool) -> Self {
        ColumnProperties {
            name: name.into(),
            data_type: data_type.into(),
            auto_increment,
        }
    }

    pub fn is_integer(&self) -> bool {
        INTEGER_TYPES
            .iter()
            .any(|t| self.data_type.eq_ignore_ascii_case(t))
    }

    /// Strictly ordered, densely comparable scalar: an auto-incrementing
    /// integer column.
    pub fn supports_ordered_pagination(&self) -> bool {
        self.auto_increment && self.is_integer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auto_increment_integers_qualify() {
        assert!(ColumnProperties::new("id", "bigint", true).supports_ordered_pagination());
        assert!(ColumnProperties::new("id", "INT", true).supports_ordered_pagination());
        assert!(!ColumnProperties::new("id", "int", false).supports_ordered_pagination());
        assert!(!ColumnProperties::new("code", "varchar", true).supports_ordered_pagination());
    }
}
