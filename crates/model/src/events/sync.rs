use crate::{
    core::identifiers::{StreamId, Version},
    records::row::RowData,
    state::bookmark::Bookmark,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt;

/// Everything a full-table sync hands to its downstream sink, in delivery
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    /// One row of the stream under `version`.
    Record {
        stream: StreamId,
        version: Version,
        row: RowData,
        time_extracted: DateTime<Utc>,
    },

    /// `version` is now the authoritative copy of `stream`.
    ActivateVersion { stream: StreamId, version: Version },

    /// The stream's latest durable bookmark.
    State { stream: StreamId, bookmark: Bookmark },
}

impl SyncMessage {
    pub fn stream(&self) -> &StreamId {
        match self {
            SyncMessage::Record { stream, .. } => stream,
            SyncMessage::ActivateVersion { stream, .. } => stream,
            SyncMessage::State { stream, .. } => stream,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            SyncMessage::Record { .. } => "RECORD",
            SyncMessage::ActivateVersion { .. } => "ACTIVATE_VERSION",
            SyncMessage::State { .. } => "STATE",
        }
    }

    /// Singer-style JSON envelope.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SyncMessage::Record {
                stream,
                version,
                row,
                time_extracted,
            } => json!({
                "type": self.message_type(),
                "stream": stream.as_str(),
                "record": row.to_json_map(),
                "version": version.get(),
                "time_extracted": time_extracted.to_rfc3339(),
            }),
            SyncMessage::ActivateVersion { stream, version } => json!({
                "type": self.message_type(),
                "stream": stream.as_str(),
                "version": version.get(),
            }),
            SyncMessage::State { stream, bookmark } => json!({
                "type": self.message_type(),
                "value": { "bookmarks": { stream.as_str(): bookmark.to_json() } },
            }),
        }
    }
}

impl fmt::Display for SyncMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMessage::Record {
                stream, version, ..
            } => write!(f, "RECORD stream={stream} version={version}"),
            SyncMessage::ActivateVersion { stream, version } => {
                write!(f, "ACTIVATE_VERSION stream={stream} version={version}")
            }
            SyncMessage::State { stream, .. } => write!(f, "STATE stream={stream}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::{FieldValue, Value};

    #[test]
    fn record_envelope_is_flat() {
        let msg = SyncMessage::Record {
            stream: "db-users".into(),
            version: Version::new(1700000000000),
            row: RowData::new(
                "users",
                vec![
                    FieldValue::new("id", Value::Int(1)),
                    FieldValue::new("name", Value::String("ada".into())),
                ],
            ),
            time_extracted: DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        assert_eq!(
            msg.to_json(),
            json!({
                "type": "RECORD",
                "stream": "db-users",
                "record": { "id": 1, "name": "ada" },
                "version": 1700000000000i64,
                "time_extracted": "2024-05-01T00:00:00+00:00",
            })
        );
    }

    #[test]
    fn state_envelope_nests_bookmark_under_stream() {
        let msg = SyncMessage::State {
            stream: "db-users".into(),
            bookmark: Bookmark::default().with_version(Version::new(3)).completed(),
        };
        assert_eq!(
            msg.to_json(),
            json!({
                "type": "STATE",
                "value": { "bookmarks": { "db-users": {
                    "version": 3, "initial_full_table_complete": true
                } } },
            })
        );
    }
}
