//! Typed row mapping for cursor-based datasets
//!
//! Binds plain Rust structs to the rows of a positioned, row-at-a-time data
//! source, so application code can read and write the current row as a
//! typed value and iterate a whole result set as typed instances without
//! per-field copy code.
//!
//! Each mapped type lists its members once through [`Mapped`]. On first use
//! against a cursor the [`Mapper`] resolves the type's mapping mode, binds
//! members to columns and caches the resulting [`TypeMetadata`] for the rest
//! of the process.
//!
//! # Example
//!
//! ```
//! use rowbind::{Column, DataType, Mapped, Mapper, MemberDescriptor, MemoryCursor, Result, Value};
//!
//! #[derive(Debug, Default)]
//! struct Employee {
//!     emp_no: i32,
//!     last_name: String,
//!     salary: f64,
//! }
//!
//! impl Mapped for Employee {
//!     fn members() -> Vec<MemberDescriptor<Self>> {
//!         vec![
//!             MemberDescriptor::field("EmpNo", |e: &Self| &e.emp_no, |e: &mut Self| &mut e.emp_no),
//!             MemberDescriptor::field(
//!                 "LastName",
//!                 |e: &Self| &e.last_name,
//!                 |e: &mut Self| &mut e.last_name,
//!             ),
//!             MemberDescriptor::field("Salary", |e: &Self| &e.salary, |e: &mut Self| &mut e.salary),
//!         ]
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut cursor = MemoryCursor::with_rows(
//!         vec![
//!             Column::new("EMPNO", DataType::Integer),
//!             Column::new("LASTNAME", DataType::Text),
//!             Column::new("SALARY", DataType::Float),
//!         ],
//!         vec![vec![Value::Integer(2), Value::Text("Nelson".into()), Value::Float(40000.0)]],
//!     )?;
//!
//!     let mapper = Mapper::default();
//!     for employee in mapper.rows::<Employee, _>(&mut cursor)? {
//!         let employee = employee?;
//!         println!("{} {} {}", employee.emp_no, employee.last_name, employee.salary);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod accessor;
pub mod convert;
pub mod cursor;
pub mod enumerator;
pub mod error;
pub mod mapping;
pub mod types;

// Re-export main types
pub use accessor::RowAccessor;
pub use convert::{ColumnValue, ConvertError};
pub use cursor::{Cursor, CursorExt, MemoryCursor};
pub use enumerator::{ByValue, EnumState, InPlace, Materialize, RowEnumerator};
pub use error::{Error, Result};
pub use mapping::{
    resolve_column, Binding, CacheStats, ColumnAnnotation, Mapped, Mapper, MapperConfig,
    MappingMode, MappingModeRegistry, MemberDescriptor, Resolution, TypeMetadata,
};
pub use types::{Column, ColumnInfo, DataType, Row, Value};
