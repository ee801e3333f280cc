//! Value typing rules
//!
//! Row data coming out of a query, or out of a snapshot file, is untyped JSON.
//! It is decoded into [`RawValue`], a closed set of shapes, and only retyped into a
//! [`FieldValue`] once the declared [`FieldType`] of its column is known.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{InfluxcatError, Result};

/// A decoded, not yet typed, row value
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Non-integral or out-of-range JSON number
    Float(f64),
    /// JSON number that fits an i64
    Integer(i64),
    /// JSON string
    String(String),
    /// JSON boolean
    Boolean(bool),
    /// Instant produced by a typed source, written as RFC3339
    Timestamp(DateTime<Utc>),
    /// JSON null
    Null,
}

impl RawValue {
    /// Name of the shape, used in type mismatch reports
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Float(_) => "float",
            RawValue::Integer(_) => "integer",
            RawValue::String(_) => "string",
            RawValue::Boolean(_) => "boolean",
            RawValue::Timestamp(_) => "timestamp",
            RawValue::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Interpret the value as a row timestamp
    pub fn to_timestamp(&self) -> Result<DateTime<Utc>> {
        match self {
            RawValue::Timestamp(ts) => Ok(*ts),
            RawValue::String(s) => parse_timestamp(s),
            other => Err(InfluxcatError::TimestampFormatError {
                value: other.to_string(),
                reason: format!("expected an RFC3339 string, found {}", other.kind()),
            }),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Float(v) => write!(f, "{}", v),
            RawValue::Integer(v) => write!(f, "{}", v),
            RawValue::String(s) => write!(f, "{:?}", s),
            RawValue::Boolean(b) => write!(f, "{}", b),
            RawValue::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            RawValue::Null => f.write_str("null"),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RawValue::Float(v) => serializer.serialize_f64(*v),
            RawValue::Integer(v) => serializer.serialize_i64(*v),
            RawValue::String(s) => serializer.serialize_str(s),
            RawValue::Boolean(b) => serializer.serialize_bool(*b),
            RawValue::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            RawValue::Null => serializer.serialize_unit(),
        }
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, string, boolean or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<RawValue, E> {
        Ok(match i64::try_from(v) {
            Ok(v) => RawValue::Integer(v),
            Err(_) => RawValue::Float(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<RawValue, E> {
        Ok(RawValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<RawValue, E> {
        Ok(RawValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<RawValue, E> {
        Ok(RawValue::Null)
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

/// Declared type of a field key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Float,
    Integer,
    String,
    Boolean,
    Timestamp,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
        }
    }

    /// Retype `value` according to this declared type.
    ///
    /// `column` is only used to label a [`InfluxcatError::TypeMismatchError`].
    pub fn convert(&self, column: &str, value: &RawValue) -> Result<FieldValue> {
        let converted = match (self, value) {
            (FieldType::Float, RawValue::Float(v)) => Some(FieldValue::Float(*v)),
            (FieldType::Float, RawValue::Integer(v)) => Some(FieldValue::Float(*v as f64)),
            (FieldType::Integer, RawValue::Integer(v)) => Some(FieldValue::Integer(*v)),
            // 2^63 itself is out of range; NaN and infinities fall outside too
            (FieldType::Integer, RawValue::Float(v))
                if (i64::MIN as f64..i64::MAX as f64).contains(&v.trunc()) =>
            {
                Some(FieldValue::Integer(v.trunc() as i64))
            }
            (FieldType::String, RawValue::String(s)) => Some(FieldValue::String(s.clone())),
            (FieldType::Boolean, RawValue::Boolean(b)) => Some(FieldValue::Boolean(*b)),
            (FieldType::Timestamp, RawValue::Timestamp(ts)) => Some(FieldValue::Timestamp(*ts)),
            (FieldType::Timestamp, RawValue::String(s)) => {
                Some(FieldValue::Timestamp(parse_timestamp(s)?))
            }
            _ => None,
        };

        converted.ok_or_else(|| InfluxcatError::TypeMismatchError {
            column: column.to_string(),
            expected: self.as_str().to_string(),
            found: format!("{} {}", value.kind(), value),
        })
    }
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "float" => Ok(FieldType::Float),
            "integer" => Ok(FieldType::Integer),
            "string" => Ok(FieldType::String),
            "boolean" => Ok(FieldType::Boolean),
            "timestamp" => Ok(FieldType::Timestamp),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value after retyping
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::String(_) => FieldType::String,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Timestamp(_) => FieldType::Timestamp,
        }
    }
}

impl From<FieldValue> for RawValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Float(v) => RawValue::Float(v),
            FieldValue::Integer(v) => RawValue::Integer(v),
            FieldValue::String(s) => RawValue::String(s),
            FieldValue::Boolean(b) => RawValue::Boolean(b),
            FieldValue::Timestamp(ts) => RawValue::Timestamp(ts),
        }
    }
}

/// Parse an RFC3339 timestamp into UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| InfluxcatError::TimestampFormatError {
            value: s.to_string(),
            reason: e.to_string(),
        })
}

/// Format a timestamp the way InfluxDB returns it: RFC3339, `Z` suffix, no trailing zeros
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> RawValue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_json_numbers_keep_their_shape() {
        assert_eq!(decode("7"), RawValue::Integer(7));
        assert_eq!(decode("-3"), RawValue::Integer(-3));
        assert_eq!(decode("7.0"), RawValue::Float(7.0));
        assert_eq!(decode("0.42"), RawValue::Float(0.42));
        assert_eq!(decode("9223372036854775807"), RawValue::Integer(i64::MAX));
        assert_eq!(decode("18446744073709551615"), RawValue::Float(u64::MAX as f64));
    }

    #[test]
    fn test_other_json_shapes() {
        assert_eq!(decode("true"), RawValue::Boolean(true));
        assert_eq!(decode("\"s1\""), RawValue::String("s1".to_string()));
        assert_eq!(decode("null"), RawValue::Null);
        assert!(serde_json::from_str::<RawValue>("[1]").is_err());
        assert!(serde_json::from_str::<RawValue>("{}").is_err());
    }

    #[test]
    fn test_serialize_preserves_precision() {
        let row = vec![
            RawValue::Float(0.1 + 0.2),
            RawValue::Integer(i64::MIN),
            RawValue::Null,
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, "[0.30000000000000004,-9223372036854775808,null]");
        let back: Vec<RawValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = parse_timestamp("2024-06-01T12:00:00Z").unwrap();
        let json = serde_json::to_string(&RawValue::Timestamp(ts)).unwrap();
        assert_eq!(json, "\"2024-06-01T12:00:00Z\"");

        let ts = parse_timestamp("2024-06-01T14:00:00.5+02:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-06-01T12:00:00.500Z");
    }

    #[test]
    fn test_integer_from_float_truncates() {
        let v = FieldType::Integer.convert("n", &RawValue::Float(7.0)).unwrap();
        assert_eq!(v, FieldValue::Integer(7));
        let v = FieldType::Integer.convert("n", &RawValue::Float(-7.9)).unwrap();
        assert_eq!(v, FieldValue::Integer(-7));
        assert!(FieldType::Integer
            .convert("n", &RawValue::Float(f64::NAN))
            .is_err());
    }

    #[test]
    fn test_integer_from_out_of_range_float_is_rejected() {
        for v in [1e30, -1e30, 9_223_372_036_854_775_808.0, f64::INFINITY] {
            let err = FieldType::Integer.convert("n", &RawValue::Float(v)).unwrap_err();
            assert!(matches!(err, InfluxcatError::TypeMismatchError { .. }));
        }

        let v = FieldType::Integer
            .convert("n", &RawValue::Float(-9_223_372_036_854_775_808.0))
            .unwrap();
        assert_eq!(v, FieldValue::Integer(i64::MIN));
    }

    #[test]
    fn test_boolean_is_never_a_string() {
        let v = FieldType::Boolean.convert("ok", &RawValue::Boolean(true)).unwrap();
        assert_eq!(v, FieldValue::Boolean(true));

        let err = FieldType::Boolean
            .convert("ok", &RawValue::String("true".to_string()))
            .unwrap_err();
        match err {
            InfluxcatError::TypeMismatchError { column, expected, found } => {
                assert_eq!(column, "ok");
                assert_eq!(expected, "boolean");
                assert_eq!(found, "string \"true\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_float_rejects_non_numeric() {
        assert!(FieldType::Float
            .convert("v", &RawValue::String("1.5".to_string()))
            .is_err());
        assert_eq!(
            FieldType::Float.convert("v", &RawValue::Integer(2)).unwrap(),
            FieldValue::Float(2.0)
        );
    }

    #[test]
    fn test_timestamp_field_is_parsed() {
        let v = FieldType::Timestamp
            .convert("seen", &RawValue::String("2023-01-01T00:00:00Z".to_string()))
            .unwrap();
        assert_eq!(
            v,
            FieldValue::Timestamp(parse_timestamp("2023-01-01T00:00:00Z").unwrap())
        );

        let err = FieldType::Timestamp
            .convert("seen", &RawValue::String("yesterday".to_string()))
            .unwrap_err();
        assert!(matches!(err, InfluxcatError::TimestampFormatError { .. }));
    }

    #[test]
    fn test_field_type_names() {
        for name in ["float", "integer", "string", "boolean", "timestamp"] {
            let ty: FieldType = name.parse().unwrap();
            assert_eq!(ty.to_string(), name);
        }
        assert!("duration".parse::<FieldType>().is_err());
        assert!("unsigned".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_row_timestamp_rejects_non_strings() {
        let err = RawValue::Integer(1_700_000_000).to_timestamp().unwrap_err();
        assert!(matches!(err, InfluxcatError::TimestampFormatError { .. }));
    }
}
