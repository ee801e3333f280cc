//! InfluxDB line protocol encoding for restored points

use influxcat_core::value::format_timestamp;
use influxcat_core::{FieldValue, InfluxcatError, Point, Result};

/// `measurement[,tag=value...] field=value[,field=value...] timestamp`
pub fn encode_point(point: &Point) -> Result<String> {
    if point.fields.is_empty() {
        return Err(InfluxcatError::WriteError(format!(
            "point {} at {} has no fields",
            point.measurement,
            format_timestamp(&point.timestamp)
        )));
    }

    let nanos = point.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        InfluxcatError::WriteError(format!(
            "timestamp {} is outside the nanosecond range",
            format_timestamp(&point.timestamp)
        ))
    })?;

    let mut line = escape(&point.measurement, &[',', ' ']);

    // Empty tag values are not representable
    for (key, value) in point.tags.iter().filter(|(_, v)| !v.is_empty()) {
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&field_value(key, value)?);
    }

    line.push(' ');
    line.push_str(&nanos.to_string());
    Ok(line)
}

/// One line per point
pub fn encode_batch(points: &[Point]) -> Result<String> {
    let lines = points.iter().map(encode_point).collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

fn field_value(key: &str, value: &FieldValue) -> Result<String> {
    Ok(match value {
        FieldValue::Float(v) if !v.is_finite() => {
            return Err(InfluxcatError::WriteError(format!(
                "field {} has non-finite value {}",
                key, v
            )))
        }
        FieldValue::Float(v) => v.to_string(),
        FieldValue::Integer(v) => format!("{}i", v),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::String(s) => quote(s),
        // No native timestamp field type, stored as its RFC3339 text
        FieldValue::Timestamp(ts) => quote(&format_timestamp(ts)),
    })
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
