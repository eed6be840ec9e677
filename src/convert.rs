//! Conversions between column values and Rust member types.
//!
//! Every mapped member type implements [`ColumnValue`]. The declared
//! `DATA_TYPE` is what metadata building checks against a column's type;
//! `from_value` and `to_value` perform the per-row conversion.
//!
//! Integers narrow only when the value fits. Integer values widen into float
//! members when the float holds them exactly. Floats never convert into
//! integer members.

use bytes::Bytes;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::{DataType, Value};

/// Failure converting a single value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Value type is a different category than the target.
    #[error("expected {expected}, found {found}")]
    Incompatible { found: DataType, expected: DataType },

    /// Value does not fit the narrower target type.
    #[error("value {value} does not fit in {target}")]
    OutOfRange { value: String, target: &'static str },

    /// NULL where the target cannot represent it.
    #[error("unexpected NULL")]
    Null,
}

/// A Rust type that can be stored in, and loaded from, a column.
pub trait ColumnValue: Sized {
    /// Runtime type tag of this member type.
    const DATA_TYPE: DataType;

    /// Convert a column value into this type.
    fn from_value(value: Value) -> Result<Self, ConvertError>;

    /// Convert this value into a column value of `DATA_TYPE`.
    fn to_value(&self) -> Result<Value, ConvertError>;
}

/// First `f64` above `i64::MAX`; float-to-integer casts saturate from here.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// `n` as an `f64`, if the float represents it exactly.
pub(crate) fn exact_f64(n: i64) -> Option<f64> {
    let f = n as f64;
    (f < I64_BOUND && f as i64 == n).then_some(f)
}

/// `n` as an `f32`, if the float represents it exactly.
pub(crate) fn exact_f32(n: i64) -> Option<f32> {
    let f = n as f32;
    (f64::from(f) < I64_BOUND && f as i64 == n).then_some(f)
}

/// `f` as an `f32`, if no precision is lost.
fn exact_narrow(f: f64) -> Option<f32> {
    let narrowed = f as f32;
    (f64::from(narrowed) == f || f.is_nan()).then_some(narrowed)
}

fn out_of_range(value: impl ToString, target: &'static str) -> ConvertError {
    ConvertError::OutOfRange {
        value: value.to_string(),
        target,
    }
}

fn unexpected(value: &Value, expected: DataType) -> ConvertError {
    match value.data_type() {
        None => ConvertError::Null,
        Some(found) => ConvertError::Incompatible { found, expected },
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl ColumnValue for $ty {
            const DATA_TYPE: DataType = DataType::Integer;

            fn from_value(value: Value) -> Result<Self, ConvertError> {
                match value {
                    Value::Integer(n) => <$ty>::try_from(n).map_err(|_| ConvertError::OutOfRange {
                        value: n.to_string(),
                        target: stringify!($ty),
                    }),
                    other => Err(unexpected(&other, DataType::Integer)),
                }
            }

            fn to_value(&self) -> Result<Value, ConvertError> {
                Ok(Value::Integer(i64::from(*self)))
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32);

impl ColumnValue for u64 {
    const DATA_TYPE: DataType = DataType::Integer;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Integer(n) => u64::try_from(n).map_err(|_| ConvertError::OutOfRange {
                value: n.to_string(),
                target: "u64",
            }),
            other => Err(unexpected(&other, DataType::Integer)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        i64::try_from(*self)
            .map(Value::Integer)
            .map_err(|_| ConvertError::OutOfRange {
                value: self.to_string(),
                target: "i64",
            })
    }
}

impl ColumnValue for f64 {
    const DATA_TYPE: DataType = DataType::Float;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(n) => exact_f64(n).ok_or_else(|| out_of_range(n, "f64")),
            other => Err(unexpected(&other, DataType::Float)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::Float(*self))
    }
}

impl ColumnValue for f32 {
    const DATA_TYPE: DataType = DataType::Float;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(f) => exact_narrow(f).ok_or_else(|| out_of_range(f, "f32")),
            Value::Integer(n) => exact_f32(n).ok_or_else(|| out_of_range(n, "f32")),
            other => Err(unexpected(&other, DataType::Float)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl ColumnValue for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(unexpected(&other, DataType::Boolean)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::Boolean(*self))
    }
}

impl ColumnValue for String {
    const DATA_TYPE: DataType = DataType::Text;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(unexpected(&other, DataType::Text)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::Text(self.clone()))
    }
}

impl ColumnValue for NaiveDateTime {
    const DATA_TYPE: DataType = DataType::DateTime;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => Err(unexpected(&other, DataType::DateTime)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::DateTime(*self))
    }
}

impl ColumnValue for Bytes {
    const DATA_TYPE: DataType = DataType::Bytes;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(unexpected(&other, DataType::Bytes)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl ColumnValue for Vec<u8> {
    const DATA_TYPE: DataType = DataType::Bytes;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bytes(b) => Ok(b.to_vec()),
            other => Err(unexpected(&other, DataType::Bytes)),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        Ok(Value::Bytes(Bytes::copy_from_slice(self)))
    }
}

impl<V: ColumnValue> ColumnValue for Option<V> {
    const DATA_TYPE: DataType = V::DATA_TYPE;

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Result<Value, ConvertError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}
