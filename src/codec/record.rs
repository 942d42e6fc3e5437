//! MessagePack map ⇄ `LogRecord` field mapping.
//!
//! Producers serialize standard logging records, so keys follow that vocabulary:
//! `levelname`, `msg`, `time`, `funcName`, `lineno` and so on. Every field the
//! producer adds beyond the named ones is stringified before packing, which is why
//! integer fields here also accept decimal strings.

use crate::model::{Diagnostics, LogLevel, LogRecord, SchemaError};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rmpv::Value;
use std::collections::BTreeMap;

const KEY_LEVEL: &str = "levelname";
const KEY_MSG: &str = "msg";
const KEY_MESSAGE: &str = "message";
const KEY_TIME: &str = "time";
const KEY_CREATED: &str = "created";
const KEY_MODULE: &str = "module";
const KEY_FUNCTION: &str = "funcName";
const KEY_LINE: &str = "lineno";
const KEY_PATH: &str = "pathname";
const KEY_PROCESS: &str = "process";
const KEY_PROCESS_NAME: &str = "processName";
const KEY_THREAD_NAME: &str = "threadName";
const KEY_TASK_NAME: &str = "taskName";
const KEY_LOGGER: &str = "name";
const KEY_STATUS: &str = "status";

/// Naive ISO-8601 as produced by `datetime.isoformat()` without a zone.
const NAIVE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse one MessagePack value into a record.
///
/// The slice must hold exactly one value, and it must be a map with string keys.
pub fn from_msgpack(bytes: &[u8]) -> Result<LogRecord, SchemaError> {
    let mut cursor = bytes;
    let value = rmpv::decode::read_value(&mut cursor)
        .map_err(|e| SchemaError::Msgpack(e.to_string()))?;
    if !cursor.is_empty() {
        return Err(SchemaError::TrailingBytes);
    }
    from_value(value)
}

/// Map a decoded MessagePack value onto a record.
pub fn from_value(value: Value) -> Result<LogRecord, SchemaError> {
    let entries = match value {
        Value::Map(entries) => entries,
        other => {
            return Err(SchemaError::NotAMap {
                found: type_name(&other),
            })
        }
    };

    let mut fields = BTreeMap::new();
    for (key, value) in entries {
        let key = match key {
            Value::String(s) => s.into_str().ok_or(SchemaError::NonStringKey)?,
            _ => return Err(SchemaError::NonStringKey),
        };
        fields.insert(key, value);
    }

    let level = take_string(&mut fields, KEY_LEVEL)?
        .map(|name| LogLevel::parse(&name))
        .ok_or(SchemaError::MissingField { field: KEY_LEVEL })?;

    let message = match take_string(&mut fields, KEY_MSG)? {
        Some(msg) => msg,
        None => take_string(&mut fields, KEY_MESSAGE)?
            .ok_or(SchemaError::MissingField { field: KEY_MSG })?,
    };

    let timestamp = take_timestamp(&mut fields)?;

    let diagnostics = Diagnostics {
        module: take_string(&mut fields, KEY_MODULE)?,
        function: take_string(&mut fields, KEY_FUNCTION)?,
        line: take_u32(&mut fields, KEY_LINE)?,
        source_path: take_string(&mut fields, KEY_PATH)?,
        process_id: take_u32(&mut fields, KEY_PROCESS)?,
        process_name: take_string(&mut fields, KEY_PROCESS_NAME)?,
        thread_name: take_string(&mut fields, KEY_THREAD_NAME)?,
        task_name: take_string(&mut fields, KEY_TASK_NAME)?,
        logger_name: take_string(&mut fields, KEY_LOGGER)?,
        status: take_string(&mut fields, KEY_STATUS)?,
    };

    Ok(LogRecord::new(level, message, timestamp)
        .with_diagnostics(diagnostics)
        .with_extra(fields))
}

/// Build the MessagePack map for a record, using the producer's key names.
pub fn to_value(record: &LogRecord) -> Value {
    let mut entries: Vec<(Value, Value)> = vec![
        (KEY_LEVEL.into(), record.level().as_str().into()),
        (KEY_MSG.into(), record.message().into()),
        (
            KEY_TIME.into(),
            record
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                .into(),
        ),
    ];

    let d = record.diagnostics();
    let strings = [
        (KEY_MODULE, &d.module),
        (KEY_FUNCTION, &d.function),
        (KEY_PATH, &d.source_path),
        (KEY_PROCESS_NAME, &d.process_name),
        (KEY_THREAD_NAME, &d.thread_name),
        (KEY_TASK_NAME, &d.task_name),
        (KEY_LOGGER, &d.logger_name),
        (KEY_STATUS, &d.status),
    ];
    for (key, value) in strings {
        if let Some(value) = value {
            entries.push((key.into(), value.as_str().into()));
        }
    }
    for (key, value) in [(KEY_LINE, d.line), (KEY_PROCESS, d.process_id)] {
        if let Some(value) = value {
            entries.push((key.into(), value.into()));
        }
    }

    for (key, value) in record.extra() {
        entries.push((key.as_str().into(), value.clone()));
    }

    Value::Map(entries)
}

fn take_string(
    fields: &mut BTreeMap<String, Value>,
    field: &'static str,
) -> Result<Option<String>, SchemaError> {
    match fields.remove(field) {
        None | Some(Value::Nil) => Ok(None),
        Some(Value::String(s)) => s.into_str().map(Some).ok_or(SchemaError::InvalidField {
            field,
            expected: "a UTF-8 string",
        }),
        Some(_) => Err(SchemaError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn take_u32(
    fields: &mut BTreeMap<String, Value>,
    field: &'static str,
) -> Result<Option<u32>, SchemaError> {
    let invalid = SchemaError::InvalidField {
        field,
        expected: "an unsigned 32-bit integer",
    };
    match fields.remove(field) {
        None | Some(Value::Nil) => Ok(None),
        Some(Value::Integer(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or(invalid),
        Some(Value::String(s)) => s
            .as_str()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(Some)
            .ok_or(invalid),
        Some(_) => Err(invalid),
    }
}

fn take_timestamp(fields: &mut BTreeMap<String, Value>) -> Result<DateTime<Utc>, SchemaError> {
    match fields.remove(KEY_TIME) {
        None | Some(Value::Nil) => {}
        Some(Value::String(s)) => {
            let raw = s.into_str().ok_or(SchemaError::InvalidField {
                field: KEY_TIME,
                expected: "a UTF-8 string",
            })?;
            return parse_iso_time(&raw);
        }
        Some(_) => {
            return Err(SchemaError::InvalidField {
                field: KEY_TIME,
                expected: "an ISO-8601 string",
            })
        }
    }

    let seconds = match fields.remove(KEY_CREATED) {
        None | Some(Value::Nil) => return Err(SchemaError::MissingField { field: KEY_TIME }),
        Some(Value::F64(secs)) => secs,
        Some(Value::F32(secs)) => f64::from(secs),
        Some(Value::Integer(n)) => n.as_f64().ok_or(SchemaError::InvalidTimestamp {
            raw: n.to_string(),
        })?,
        Some(Value::String(s)) => {
            let raw = s.as_str().unwrap_or_default().to_string();
            raw.trim()
                .parse::<f64>()
                .map_err(|_| SchemaError::InvalidTimestamp { raw })?
        }
        Some(_) => {
            return Err(SchemaError::InvalidField {
                field: KEY_CREATED,
                expected: "seconds since the epoch",
            })
        }
    };
    from_epoch_seconds(seconds)
}

fn parse_iso_time(raw: &str) -> Result<DateTime<Utc>, SchemaError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| SchemaError::InvalidTimestamp {
            raw: raw.to_string(),
        })
}

fn from_epoch_seconds(seconds: f64) -> Result<DateTime<Utc>, SchemaError> {
    let invalid = || SchemaError::InvalidTimestamp {
        raw: seconds.to_string(),
    };
    if !seconds.is_finite() {
        return Err(invalid());
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(invalid());
    }
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(invalid)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(..) => "extension",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RESERVED_FIELDS;
    use chrono::TimeZone;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn minimal(extra: Vec<(&str, Value)>) -> Value {
        let mut entries = vec![
            ("levelname", Value::from("INFO")),
            ("msg", Value::from("epoch 1 done")),
            ("time", Value::from("2025-03-01T12:00:00.250000")),
        ];
        entries.extend(extra);
        map(entries)
    }

    #[test]
    fn every_mapped_key_is_reserved() {
        let mapped = [
            KEY_LEVEL,
            KEY_MSG,
            KEY_MESSAGE,
            KEY_TIME,
            KEY_CREATED,
            KEY_MODULE,
            KEY_FUNCTION,
            KEY_LINE,
            KEY_PATH,
            KEY_PROCESS,
            KEY_PROCESS_NAME,
            KEY_THREAD_NAME,
            KEY_TASK_NAME,
            KEY_LOGGER,
            KEY_STATUS,
        ];
        for key in mapped {
            assert!(RESERVED_FIELDS.contains(&key), "{key} is not reserved");
        }
    }

    #[test]
    fn minimal_record_decodes() {
        let record = from_value(minimal(vec![])).expect("valid record");
        assert_eq!(record.level(), &LogLevel::Info);
        assert_eq!(record.message(), "epoch 1 done");
        assert_eq!(
            record.timestamp(),
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + chrono::Duration::milliseconds(250)
        );
        assert!(record.extra().is_empty());
    }

    #[test]
    fn rfc3339_time_with_offset_is_converted_to_utc() {
        let value = map(vec![
            ("levelname", "INFO".into()),
            ("msg", "x".into()),
            ("time", "2025-03-01T14:00:00+02:00".into()),
        ]);
        let record = from_value(value).expect("valid record");
        assert_eq!(
            record.timestamp(),
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn created_seconds_are_used_when_time_is_absent() {
        let value = map(vec![
            ("levelname", "INFO".into()),
            ("msg", "x".into()),
            ("created", Value::F64(1_700_000_000.5)),
        ]);
        let record = from_value(value).expect("valid record");
        assert_eq!(record.timestamp().timestamp(), 1_700_000_000);
        assert_eq!(record.timestamp().timestamp_subsec_millis(), 500);
    }

    #[test]
    fn missing_time_and_created_is_missing_field() {
        let value = map(vec![("levelname", "INFO".into()), ("msg", "x".into())]);
        assert_eq!(
            from_value(value),
            Err(SchemaError::MissingField { field: "time" })
        );
    }

    #[test]
    fn garbage_time_is_invalid_timestamp() {
        let value = map(vec![
            ("levelname", "INFO".into()),
            ("msg", "x".into()),
            ("time", "yesterday".into()),
        ]);
        assert_eq!(
            from_value(value),
            Err(SchemaError::InvalidTimestamp {
                raw: "yesterday".into()
            })
        );
    }

    #[test]
    fn missing_level_is_missing_field() {
        let value = map(vec![("msg", "x".into()), ("time", "2025-03-01T12:00:00".into())]);
        assert_eq!(
            from_value(value),
            Err(SchemaError::MissingField { field: "levelname" })
        );
    }

    #[test]
    fn message_key_is_fallback_for_msg() {
        let value = map(vec![
            ("levelname", "INFO".into()),
            ("message", "fallback".into()),
            ("time", "2025-03-01T12:00:00".into()),
        ]);
        assert_eq!(from_value(value).expect("valid").message(), "fallback");
    }

    #[test]
    fn msg_wins_and_unused_message_is_dropped() {
        let record =
            from_value(minimal(vec![("message", "formatted".into())])).expect("valid record");
        assert_eq!(record.message(), "epoch 1 done");
        assert!(record.extra().get("message").is_none());
    }

    #[test]
    fn stringified_integers_are_accepted() {
        let record = from_value(minimal(vec![
            ("lineno", "88".into()),
            ("process", "4242".into()),
        ]))
        .expect("valid record");
        assert_eq!(record.diagnostics().line, Some(88));
        assert_eq!(record.diagnostics().process_id, Some(4242));
    }

    #[test]
    fn non_numeric_line_is_invalid_field() {
        let result = from_value(minimal(vec![("lineno", "eighty".into())]));
        assert!(matches!(
            result,
            Err(SchemaError::InvalidField { field: "lineno", .. })
        ));
    }

    #[test]
    fn nil_diagnostics_are_treated_as_absent() {
        let record =
            from_value(minimal(vec![("taskName", Value::Nil)])).expect("valid record");
        assert_eq!(record.diagnostics().task_name, None);
        assert!(record.extra().is_empty());
    }

    #[test]
    fn unknown_fields_are_preserved_in_extra() {
        let record = from_value(minimal(vec![
            ("thread", Value::from(140_000_u64)),
            ("levelno", "20".into()),
        ]))
        .expect("valid record");
        assert_eq!(record.extra().len(), 2);
        assert_eq!(record.extra().get("levelno"), Some(&Value::from("20")));
    }

    #[test]
    fn non_map_is_rejected() {
        assert_eq!(
            from_value(Value::from("just a string")),
            Err(SchemaError::NotAMap { found: "string" })
        );
    }

    #[test]
    fn integer_key_is_rejected() {
        let value = Value::Map(vec![(Value::from(1), Value::from("x"))]);
        assert_eq!(from_value(value), Err(SchemaError::NonStringKey));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = Vec::new();
        rmpv::encode::write_value(&mut bytes, &minimal(vec![])).expect("encode");
        bytes.push(0xc0);
        assert_eq!(from_msgpack(&bytes), Err(SchemaError::TrailingBytes));
    }

    #[test]
    fn to_value_then_from_value_preserves_every_field() {
        let diagnostics = Diagnostics {
            module: Some("trainer".into()),
            function: Some("fit".into()),
            line: Some(120),
            source_path: Some("/srv/trainer.py".into()),
            process_id: Some(77),
            process_name: Some("MainProcess".into()),
            thread_name: Some("MainThread".into()),
            task_name: Some("None".into()),
            logger_name: Some("client-1".into()),
            status: Some("completed".into()),
        };
        let mut extra = BTreeMap::new();
        extra.insert("epoch".to_string(), Value::from("3"));
        let record = LogRecord::new(
            LogLevel::Success,
            "Process completed successfully",
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + chrono::Duration::nanoseconds(123_456_789),
        )
        .with_diagnostics(diagnostics)
        .with_extra(extra);

        assert_eq!(from_value(to_value(&record)), Ok(record));
    }
}
