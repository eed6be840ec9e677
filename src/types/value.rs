//! Column values held by cursor rows.

use bytes::Bytes;
use chrono::NaiveDateTime;
use std::fmt;

use super::data_type::DataType;
use crate::convert::{exact_f64, ConvertError};

/// A single column value together with its runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Date/time value (no timezone).
    DateTime(NaiveDateTime),
    /// Binary value.
    Bytes(Bytes),
}

impl Value {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type tag of the value, `None` for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Integer(_) => Some(DataType::Integer),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Bytes(_) => Some(DataType::Bytes),
        }
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as f64.
    ///
    /// Integers widen only when the float holds them exactly.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => exact_f64(*n),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Convert this value so it can be stored in a column of type `target`.
    ///
    /// Integers widen to floats and floats narrow to integers only when the
    /// target type holds the value exactly.
    pub fn coerce_to(self, target: DataType) -> Result<Value, ConvertError> {
        let Some(source) = self.data_type() else {
            return Ok(Value::Null);
        };
        if source == target {
            return Ok(self);
        }
        match (self, target) {
            (Value::Integer(n), DataType::Float) => {
                exact_f64(n)
                    .map(Value::Float)
                    .ok_or_else(|| ConvertError::OutOfRange {
                        value: n.to_string(),
                        target: "f64",
                    })
            }
            (Value::Float(f), DataType::Integer) => {
                if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
                {
                    Ok(Value::Integer(f as i64))
                } else {
                    Err(ConvertError::OutOfRange {
                        value: f.to_string(),
                        target: "i64",
                    })
                }
            }
            (_, target) => Err(ConvertError::Incompatible {
                found: source,
                expected: target,
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Bytes(b) => write!(f, "<BYTES: {} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}
