use std::fmt;

use chrono::NaiveDateTime;

use crate::decimal::Decimal;

/// Scalar value as produced by the metadata and query layers.
///
/// An important thing to note is that a datum does not carry its own wire
/// type. The same `Int64` may go out tagged `xsd:int` or `xsd:long`
/// depending on the canonicalization hint; see [`crate::ValueInfo`].
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    /// Integral value wider than 64 bits. Plays the role of the
    /// arbitrary-precision integer.
    Int128(i128),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// The integral value, when the datum holds one exactly.
    pub fn as_integral(&self) -> Option<i128> {
        match self {
            Datum::Int8(v) => Some(*v as i128),
            Datum::Int16(v) => Some(*v as i128),
            Datum::Int32(v) => Some(*v as i128),
            Datum::Int64(v) => Some(*v as i128),
            Datum::Int128(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    /// Wire text rendering. Floats use the shortest representation that
    /// round-trips; datetimes use the XSD lexical form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => Ok(()),
            Datum::Bool(v) => write!(f, "{}", v),
            Datum::Int8(v) => write!(f, "{}", v),
            Datum::Int16(v) => write!(f, "{}", v),
            Datum::Int32(v) => write!(f, "{}", v),
            Datum::Int64(v) => write!(f, "{}", v),
            Datum::Int128(v) => write!(f, "{}", v),
            Datum::Float32(v) => write!(f, "{}", format_float(*v as f64)),
            Datum::Float64(v) => write!(f, "{}", format_float(*v)),
            Datum::Decimal(v) => write!(f, "{}", v),
            Datum::Text(v) => f.write_str(v),
            Datum::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// Shortest round-trip float text. NaN and infinities take the XSD
/// spellings.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let mut buf = dtoa::Buffer::new();
    buf.format(v).to_string()
}

impl From<&str> for Datum {
    fn from(v: &str) -> Datum {
        Datum::Text(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Datum {
        Datum::Text(v)
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Datum {
        Datum::Bool(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Datum {
        Datum::Int32(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Datum {
        Datum::Int64(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Datum {
        Datum::Float64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_text() {
        assert_eq!(Datum::Bool(true).to_string(), "true");
        assert_eq!(Datum::Int64(-42).to_string(), "-42");
        assert_eq!(Datum::Float64(0.5).to_string(), "0.5");
        assert_eq!(Datum::Float64(f64::INFINITY).to_string(), "INF");
        assert_eq!(Datum::Text("Sales".into()).to_string(), "Sales");
        assert_eq!(Datum::Null.to_string(), "");
    }
}
