use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;

/// Data type of a tag, named the way the tag service names them on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) enum DataType {
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "INT")]
    Int32,
    #[serde(rename = "U_INT64")]
    UInt64,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "DATE_TIME")]
    DateTime,
}

impl DataType {
    pub(crate) fn name(self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int32 => "INT",
            DataType::UInt64 => "U_INT64",
            DataType::Double => "DOUBLE",
            DataType::String => "STRING",
            DataType::DateTime => "DATE_TIME",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed tag value
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TagValue {
    Bool(bool),
    Int32(i32),
    UInt64(u64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl TagValue {
    pub(crate) fn data_type(&self) -> DataType {
        match self {
            TagValue::Bool(_) => DataType::Boolean,
            TagValue::Int32(_) => DataType::Int32,
            TagValue::UInt64(_) => DataType::UInt64,
            TagValue::Double(_) => DataType::Double,
            TagValue::String(_) => DataType::String,
            TagValue::DateTime(_) => DataType::DateTime,
        }
    }

    /// Parse the string form used by the tag service
    pub(crate) fn parse(data_type: DataType, raw: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidValue {
            data_type,
            raw: raw.to_string(),
        };
        let value = match data_type {
            DataType::Boolean => match raw.trim() {
                s if s.eq_ignore_ascii_case("true") => TagValue::Bool(true),
                s if s.eq_ignore_ascii_case("false") => TagValue::Bool(false),
                _ => return Err(invalid()),
            },
            DataType::Int32 => TagValue::Int32(raw.trim().parse().map_err(|_| invalid())?),
            DataType::UInt64 => TagValue::UInt64(raw.trim().parse().map_err(|_| invalid())?),
            DataType::Double => TagValue::Double(raw.trim().parse().map_err(|_| invalid())?),
            DataType::String => TagValue::String(raw.to_string()),
            DataType::DateTime => TagValue::DateTime(
                DateTime::parse_from_rfc3339(raw.trim())
                    .map_err(|_| invalid())?
                    .with_timezone(&Utc),
            ),
        };
        Ok(value)
    }

    /// String form sent to the tag service
    pub(crate) fn to_wire(&self) -> String {
        match self {
            TagValue::Bool(true) => "True".to_string(),
            TagValue::Bool(false) => "False".to_string(),
            TagValue::Int32(v) => v.to_string(),
            TagValue::UInt64(v) => v.to_string(),
            TagValue::Double(v) => v.to_string(),
            TagValue::String(v) => v.clone(),
            TagValue::DateTime(v) => format_timestamp(*v),
        }
    }

    /// JSON representation for `--json` output
    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            TagValue::Bool(v) => serde_json::json!(v),
            TagValue::Int32(v) => serde_json::json!(v),
            TagValue::UInt64(v) => serde_json::json!(v),
            TagValue::Double(v) if v.is_finite() => serde_json::json!(v),
            TagValue::Double(v) => serde_json::json!(v.to_string()),
            TagValue::String(v) => serde_json::json!(v),
            TagValue::DateTime(v) => serde_json::json!(format_timestamp(*v)),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            TagValue::Int32(v) => write!(f, "{v}"),
            TagValue::UInt64(v) => write!(f, "{v}"),
            TagValue::Double(v) => write!(f, "{v}"),
            TagValue::String(v) => f.write_str(v),
            TagValue::DateTime(v) => f.write_str(&format_timestamp(*v)),
        }
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Path and data type of a tag; returned by `open` and used to build selections
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TagData {
    pub(crate) path: String,
    pub(crate) data_type: DataType,
}

impl TagData {
    pub(crate) fn new(path: impl Into<String>, data_type: DataType) -> Self {
        Self {
            path: path.into(),
            data_type,
        }
    }
}

/// Result of reading a tag that has a value
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReadResult {
    pub(crate) value: TagValue,
    pub(crate) timestamp: Option<DateTime<Utc>>,
}

impl ReadResult {
    pub(crate) fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

/// One pending update held by a buffered writer
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagWrite {
    pub(crate) path: String,
    pub(crate) value: TagValue,
    pub(crate) timestamp: DateTime<Utc>,
}
