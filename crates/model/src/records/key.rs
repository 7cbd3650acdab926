use crate::{core::value::Value, records::row::RowData};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

/// Key column name -> value, as stored in bookmarks (`max_pk_values`,
/// `last_pk_fetched`).
///
/// The map itself is unordered; every positional use goes through the
/// stream's ordered key column list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValues(BTreeMap<String, Value>);

impl KeyValues {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Extracts the key tuple of `row`. Returns `None` when any key column is
    /// missing or NULL, since such a row cannot anchor a keyset cursor.
    pub fn from_row(row: &RowData, key_columns: &[String]) -> Option<Self> {
        let mut keys = KeyValues::new();
        for column in key_columns {
            let value = row.get_value(column);
            if value.is_null() {
                return None;
            }
            keys.insert(column.clone(), value);
        }
        Some(keys)
    }

    /// Values in key column order, or `None` if a column has no entry.
    pub fn ordered<'a>(&'a self, key_columns: &[String]) -> Option<Vec<&'a Value>> {
        key_columns.iter().map(|c| self.0.get(c)).collect()
    }

    pub fn covers(&self, key_columns: &[String]) -> bool {
        key_columns.iter().all(|c| self.0.contains_key(c))
    }

    /// Lexicographic comparison over `key_columns`. `None` if either side is
    /// missing a column or a pair of values is incomparable.
    pub fn compare(&self, other: &KeyValues, key_columns: &[String]) -> Option<Ordering> {
        for column in key_columns {
            let ord = self.0.get(column)?.compare(other.0.get(column)?)?;
            if ord != Ordering::Equal {
                return Some(ord);
            }
        }
        Some(Ordering::Equal)
    }
}

impl FromIterator<(String, Value)> for KeyValues {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::FieldValue;

    fn keys(pairs: &[(&str, i64)]) -> KeyValues {
        pairs
            .iter()
            .map(|(c, v)| (c.to_string(), Value::Int(*v)))
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn compares_lexicographically_in_key_order() {
        let k = cols(&["a", "b"]);
        let lo = keys(&[("a", 1), ("b", 9)]);
        let hi = keys(&[("a", 2), ("b", 1)]);
        assert_eq!(lo.compare(&hi, &k), Some(Ordering::Less));
        assert_eq!(hi.compare(&lo, &k), Some(Ordering::Greater));
        assert_eq!(lo.compare(&lo, &k), Some(Ordering::Equal));

        // Reversing the column order reverses the verdict.
        let reversed = cols(&["b", "a"]);
        assert_eq!(lo.compare(&hi, &reversed), Some(Ordering::Greater));
    }

    #[test]
    fn from_row_rejects_null_keys() {
        let row = RowData::new(
            "t",
            vec![
                FieldValue::new("a", Value::Int(1)),
                FieldValue::new("b", Value::Null),
            ],
        );
        assert!(KeyValues::from_row(&row, &cols(&["a"])).is_some());
        assert!(KeyValues::from_row(&row, &cols(&["a", "b"])).is_none());
    }

    #[test]
    fn serializes_as_plain_map() {
        let k = keys(&[("id", 5)]);
        let json = serde_json::to_value(&k).unwrap();
        assert_eq!(json, serde_json::json!({ "id": { "Int": 5 } }));
        let back: KeyValues = serde_json::from_value(json).unwrap();
        assert_eq!(back, k);
    }
}
