//! Column data types.
//!
//! A `DataType` is the runtime type tag of a column or of a non-NULL value.
//! Nullability is a column property, not a type property.

use std::fmt;

/// Runtime type tag shared by columns, values and mapped members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean flag.
    Boolean,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// Text.
    Text,
    /// Date and time without timezone.
    DateTime,
    /// Raw binary data.
    Bytes,
}

impl DataType {
    /// Whether a column of this type can be read into a member of type `member`.
    ///
    /// Identical types always bind. An integer column may widen into a float
    /// member; no other cross-category binding is allowed.
    pub fn can_read_as(self, member: DataType) -> bool {
        self == member || matches!((self, member), (DataType::Integer, DataType::Float))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::DateTime => "DATETIME",
            DataType::Bytes => "BYTES",
        };
        f.write_str(name)
    }
}
