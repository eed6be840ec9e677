//! Dataset value model: column types, values, columns and rows.

mod column;
mod data_type;
mod row;
mod value;

pub use column::{Column, ColumnInfo};
pub use data_type::DataType;
pub use row::Row;
pub use value::Value;
