use crate::sql::base::error::DbError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mysql_async::{Column, Row as MySqlRow, Value as MySqlValue, consts::ColumnType};

/// `binary` pseudo-charset: the column holds raw bytes, not text.
const BINARY_CHARSET: u16 = 63;

/// Converts a driver row into [`RowData`] tagged with `table`.
pub fn to_row_data(table: &str, row: MySqlRow) -> Result<RowData, DbError> {
    let columns = row.columns();
    let raw = row.unwrap_raw();

    let mut fields = Vec::with_capacity(columns.len());
    for (column, value) in columns.iter().zip(raw) {
        let name = column.name_str().into_owned();
        let value = match value {
            Some(value) => decode_value(column, &name, value)?,
            None => Value::Null,
        };
        fields.push(FieldValue::new(name, value));
    }

    Ok(RowData::new(table, fields))
}

fn decode_value(column: &Column, name: &str, value: MySqlValue) -> Result<Value, DbError> {
    let decoded = match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Int(i),
        MySqlValue::UInt(u) => Value::Uint(u),
        MySqlValue::Float(f) => Value::Float(f64::from(f)),
        MySqlValue::Double(f) => Value::Float(f),
        MySqlValue::Bytes(bytes) if column.character_set() == BINARY_CHARSET => Value::Bytes(bytes),
        MySqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        },
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .ok_or_else(|| unsupported(name, format!("invalid date {year}-{month}-{day}")))?;
            if column.column_type() == ColumnType::MYSQL_TYPE_DATE {
                Value::Date(date)
            } else {
                let time = NaiveTime::from_hms_micro_opt(
                    u32::from(hour),
                    u32::from(minute),
                    u32::from(second),
                    micros,
                )
                .ok_or_else(|| unsupported(name, format!("invalid time {hour}:{minute}:{second}")))?;
                Value::Timestamp(NaiveDateTime::new(date, time).and_utc())
            }
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            Value::String(format!(
                "{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    };
    Ok(decoded)
}

fn unsupported(column: &str, detail: String) -> DbError {
    DbError::UnsupportedType {
        column: column.to_string(),
        detail,
    }
}
