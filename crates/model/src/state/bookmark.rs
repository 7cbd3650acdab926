//! Per-stream resumption state.
//!
//! A [`Bookmark`] is an immutable value: every update returns a new bookmark
//! that the caller persists as the next checkpoint. Raw persisted state is
//! projected onto the fixed field set exactly once, at load time.

use crate::{
    core::identifiers::Version,
    records::key::KeyValues,
    state::BookmarkError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookmarkField {
    Version,
    InitialFullTableComplete,
    MaxPkValues,
    LastPkFetched,
}

impl BookmarkField {
    pub const ALL: [BookmarkField; 4] = [
        BookmarkField::Version,
        BookmarkField::InitialFullTableComplete,
        BookmarkField::MaxPkValues,
        BookmarkField::LastPkFetched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkField::Version => "version",
            BookmarkField::InitialFullTableComplete => "initial_full_table_complete",
            BookmarkField::MaxPkValues => "max_pk_values",
            BookmarkField::LastPkFetched => "last_pk_fetched",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for BookmarkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored under one [`BookmarkField`].
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkValue {
    Version(Version),
    Flag(bool),
    Keys(KeyValues),
}

/// Something `Bookmark::load` had to fix in the persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkRepair {
    /// The persisted state was not a JSON object and was discarded.
    NotAnObject,
    /// A field outside the whitelist was dropped.
    Dropped(String),
    /// A whitelisted field held an unreadable or inconsistent value and was
    /// reset to its default.
    Reset(BookmarkField),
}

impl fmt::Display for BookmarkRepair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkRepair::NotAnObject => f.write_str("state was not an object"),
            BookmarkRepair::Dropped(name) => write!(f, "dropped unknown field '{name}'"),
            BookmarkRepair::Reset(field) => write!(f, "reset field '{field}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBookmark {
    pub bookmark: Bookmark,
    pub repairs: Vec<BookmarkRepair>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bookmark {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<Version>,
    initial_full_table_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_pk_values: Option<KeyValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_pk_fetched: Option<KeyValues>,
}

/// Drops every top-level field outside the bookmark schema. Non-object input
/// projects to an empty object. Idempotent.
pub fn whitelist(raw: &JsonValue) -> JsonValue {
    match raw {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .filter(|(k, _)| BookmarkField::parse(k).is_some())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        _ => JsonValue::Object(serde_json::Map::new()),
    }
}

impl Bookmark {
    /// Builds a bookmark from raw persisted state, whitelisting its fields and
    /// replacing unreadable values with defaults. Never fails.
    pub fn load(raw: &JsonValue) -> LoadedBookmark {
        let mut repairs = Vec::new();
        let projected = whitelist(raw);
        let empty = serde_json::Map::new();
        let map = projected.as_object().unwrap_or(&empty);

        match raw {
            JsonValue::Null => {}
            JsonValue::Object(original) => repairs.extend(
                original
                    .keys()
                    .filter(|k| !map.contains_key(*k))
                    .map(|k| BookmarkRepair::Dropped(k.clone())),
            ),
            _ => repairs.push(BookmarkRepair::NotAnObject),
        }

        let mut bookmark = Bookmark {
            version: read_field(map, BookmarkField::Version, &mut repairs),
            initial_full_table_complete: read_field(
                map,
                BookmarkField::InitialFullTableComplete,
                &mut repairs,
            )
            .unwrap_or(false),
            max_pk_values: read_field(map, BookmarkField::MaxPkValues, &mut repairs),
            last_pk_fetched: read_field(map, BookmarkField::LastPkFetched, &mut repairs),
        };

        // A boundary only means something together with the version it was
        // captured for, and a cursor only within a boundary.
        if bookmark.max_pk_values.is_some() && bookmark.version.is_none() {
            bookmark.max_pk_values = None;
            repairs.push(BookmarkRepair::Reset(BookmarkField::MaxPkValues));
        }
        if bookmark.last_pk_fetched.is_some() && bookmark.max_pk_values.is_none() {
            bookmark.last_pk_fetched = None;
            repairs.push(BookmarkRepair::Reset(BookmarkField::LastPkFetched));
        }

        LoadedBookmark { bookmark, repairs }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn initial_full_table_complete(&self) -> bool {
        self.initial_full_table_complete
    }

    pub fn max_pk_values(&self) -> Option<&KeyValues> {
        self.max_pk_values.as_ref()
    }

    pub fn last_pk_fetched(&self) -> Option<&KeyValues> {
        self.last_pk_fetched.as_ref()
    }

    /// True when an attempt captured a boundary and has not finished yet.
    pub fn is_in_progress(&self) -> bool {
        self.version.is_some() && self.max_pk_values.is_some()
    }

    pub fn get(&self, field: BookmarkField) -> Option<BookmarkValue> {
        match field {
            BookmarkField::Version => self.version.map(BookmarkValue::Version),
            BookmarkField::InitialFullTableComplete => {
                Some(BookmarkValue::Flag(self.initial_full_table_complete))
            }
            BookmarkField::MaxPkValues => self.max_pk_values.clone().map(BookmarkValue::Keys),
            BookmarkField::LastPkFetched => self.last_pk_fetched.clone().map(BookmarkValue::Keys),
        }
    }

    /// Returns a copy with `field` replaced. `None` clears the field (the
    /// completion flag clears to `false`).
    pub fn with_field(
        &self,
        field: BookmarkField,
        value: Option<BookmarkValue>,
    ) -> Result<Bookmark, BookmarkError> {
        let mut next = self.clone();
        match (field, value) {
            (BookmarkField::Version, Some(BookmarkValue::Version(v))) => next.version = Some(v),
            (BookmarkField::Version, None) => next.version = None,
            (BookmarkField::InitialFullTableComplete, Some(BookmarkValue::Flag(b))) => {
                next.initial_full_table_complete = b
            }
            (BookmarkField::InitialFullTableComplete, None) => {
                next.initial_full_table_complete = false
            }
            (BookmarkField::MaxPkValues, Some(BookmarkValue::Keys(k))) => {
                next.max_pk_values = Some(k)
            }
            (BookmarkField::MaxPkValues, None) => next.max_pk_values = None,
            (BookmarkField::LastPkFetched, Some(BookmarkValue::Keys(k))) => {
                next.last_pk_fetched = Some(k)
            }
            (BookmarkField::LastPkFetched, None) => next.last_pk_fetched = None,
            (field, Some(value)) => {
                return Err(BookmarkError::TypeMismatch {
                    field,
                    value: format!("{value:?}"),
                });
            }
        }
        Ok(next)
    }

    pub fn with_version(&self, version: Version) -> Bookmark {
        Bookmark {
            version: Some(version),
            ..self.clone()
        }
    }

    pub fn with_max_pk_values(&self, boundary: KeyValues) -> Bookmark {
        Bookmark {
            max_pk_values: Some(boundary),
            ..self.clone()
        }
    }

    pub fn with_last_pk_fetched(&self, cursor: KeyValues) -> Bookmark {
        Bookmark {
            last_pk_fetched: Some(cursor),
            ..self.clone()
        }
    }

    /// Starts a new attempt under `version`, discarding any cursor and
    /// boundary. The completion flag is kept.
    pub fn fresh_attempt(&self, version: Version) -> Bookmark {
        Bookmark {
            version: Some(version),
            initial_full_table_complete: self.initial_full_table_complete,
            max_pk_values: None,
            last_pk_fetched: None,
        }
    }

    /// Marks the full pass done: sets the completion flag, clears cursor and
    /// boundary, keeps the version as the active one.
    pub fn completed(&self) -> Bookmark {
        Bookmark {
            version: self.version,
            initial_full_table_complete: true,
            max_pk_values: None,
            last_pk_fetched: None,
        }
    }
}

fn read_field<T: serde::de::DeserializeOwned>(
    map: &serde_json::Map<String, JsonValue>,
    field: BookmarkField,
    repairs: &mut Vec<BookmarkRepair>,
) -> Option<T> {
    match map.get(field.as_str()) {
        None | Some(JsonValue::Null) => None,
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(value) => Some(value),
            Err(_) => {
                repairs.push(BookmarkRepair::Reset(field));
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use serde_json::json;

    fn id_keys(id: i64) -> KeyValues {
        [("id".to_string(), Value::Int(id))].into_iter().collect()
    }

    #[test]
    fn whitelist_is_idempotent() {
        let inputs = [
            json!({}),
            json!(null),
            json!([1, 2, 3]),
            json!({ "version": 7, "replication_key": "updated_at", "foo": { "bar": 1 } }),
            json!({ "version": 1, "initial_full_table_complete": true,
                    "max_pk_values": { "id": { "Int": 5 } },
                    "last_pk_fetched": { "id": { "Int": 3 } } }),
        ];
        for raw in inputs {
            let once = whitelist(&raw);
            assert_eq!(whitelist(&once), once, "input: {raw}");
        }
    }

    #[test]
    fn load_drops_unknown_fields() {
        let raw = json!({ "version": 42, "replication_key_value": "2020-01-01" });
        let loaded = Bookmark::load(&raw);
        assert_eq!(loaded.bookmark.version(), Some(Version::new(42)));
        assert_eq!(
            loaded.repairs,
            vec![BookmarkRepair::Dropped("replication_key_value".into())]
        );
        assert_eq!(whitelist(&raw), json!({ "version": 42 }));
    }

    #[test]
    fn load_reads_only_the_whitelisted_projection() {
        let inputs = [
            json!({ "version": 5, "extra": true, "max_pk_values": { "id": { "Int": 2 } } }),
            json!({ "initial_full_table_complete": true, "version": 3, "notes": [1] }),
            json!(17),
        ];
        for raw in inputs {
            let loaded = Bookmark::load(&raw);
            assert_eq!(loaded.bookmark, Bookmark::load(&whitelist(&raw)).bookmark, "input: {raw}");
            assert_eq!(whitelist(&loaded.bookmark.to_json()), loaded.bookmark.to_json());
        }
    }

    #[test]
    fn load_resets_corrupt_values_to_defaults() {
        let raw = json!({
            "version": "not-a-number",
            "initial_full_table_complete": "yes",
            "max_pk_values": { "id": { "Int": 5 } },
        });
        let loaded = Bookmark::load(&raw);
        assert_eq!(loaded.bookmark, Bookmark::default());
        assert!(loaded.repairs.contains(&BookmarkRepair::Reset(BookmarkField::Version)));
        assert!(loaded.repairs.contains(&BookmarkRepair::Reset(
            BookmarkField::InitialFullTableComplete
        )));
        // The boundary parsed but is orphaned without a version.
        assert!(loaded.repairs.contains(&BookmarkRepair::Reset(BookmarkField::MaxPkValues)));
    }

    #[test]
    fn load_rejects_non_object_state() {
        let loaded = Bookmark::load(&json!("garbage"));
        assert_eq!(loaded.bookmark, Bookmark::default());
        assert_eq!(loaded.repairs, vec![BookmarkRepair::NotAnObject]);
    }

    #[test]
    fn in_progress_bookmark_survives_persistence() {
        let bookmark = Bookmark::default()
            .with_version(Version::new(9))
            .with_max_pk_values(id_keys(5))
            .with_last_pk_fetched(id_keys(3));
        let loaded = Bookmark::load(&bookmark.to_json());
        assert!(loaded.repairs.is_empty());
        assert_eq!(loaded.bookmark, bookmark);
        assert!(loaded.bookmark.is_in_progress());
    }

    #[test]
    fn with_field_is_pure_and_type_checked() {
        let original = Bookmark::default();
        let updated = original
            .with_field(
                BookmarkField::Version,
                Some(BookmarkValue::Version(Version::new(3))),
            )
            .unwrap();
        assert_eq!(original.version(), None);
        assert_eq!(
            updated.get(BookmarkField::Version),
            Some(BookmarkValue::Version(Version::new(3)))
        );

        let err = original
            .with_field(BookmarkField::MaxPkValues, Some(BookmarkValue::Flag(true)))
            .unwrap_err();
        assert!(matches!(
            err,
            BookmarkError::TypeMismatch {
                field: BookmarkField::MaxPkValues,
                ..
            }
        ));
    }

    #[test]
    fn completion_keeps_version_and_clears_progress() {
        let done = Bookmark::default()
            .with_version(Version::new(11))
            .with_max_pk_values(id_keys(5))
            .with_last_pk_fetched(id_keys(5))
            .completed();
        assert_eq!(done.version(), Some(Version::new(11)));
        assert!(done.initial_full_table_complete());
        assert!(done.max_pk_values().is_none());
        assert!(done.last_pk_fetched().is_none());
        assert_eq!(
            done.to_json(),
            json!({ "version": 11, "initial_full_table_complete": true })
        );
    }
}
