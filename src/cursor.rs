//! Cursor contract and an in-memory cursor.
//!
//! The `Cursor` trait is what the mapping layer needs from a positioned,
//! row-at-a-time data source: named column access on the current row,
//! forward navigation, and an externally driven edit transaction. Storage,
//! query execution and I/O all live behind it.
//!
//! `MemoryCursor` keeps its rows in a `Vec` and is used by tests and by
//! callers that materialize a result set up front.

use std::sync::Arc;

use crate::convert::ConvertError;
use crate::enumerator::{ByValue, InPlace, RowEnumerator};
use crate::error::{Error, Result};
use crate::mapping::{Mapped, Mapper};
use crate::types::{Column, ColumnInfo, DataType, Row, Value};

/// A positioned view over a sequence of rows.
///
/// A cursor is single-threaded shared state: its position is shared by
/// everyone holding it, so only one traversal may use it at a time.
pub trait Cursor {
    /// Column set of every row.
    fn columns(&self) -> &ColumnInfo;

    /// Row at the current position.
    ///
    /// While an edit is open this is the edited row. Fails with
    /// `InvalidCursorState` when there is no current row.
    fn current_row(&self) -> Result<&Row>;

    /// Store `value` in a column of the current row.
    ///
    /// Only valid while an edit is open.
    fn set_value(&mut self, column: &str, value: Value) -> Result<()>;

    /// Move to the first row.
    fn move_first(&mut self) -> Result<()>;

    /// Move to the next row. At the end this is a no-op.
    fn move_next(&mut self) -> Result<()>;

    /// Whether the cursor is past its last row.
    fn is_at_end(&self) -> bool;

    /// Whether an edit is open on the current row.
    fn is_editing(&self) -> bool;

    /// Open an edit on the current row.
    fn begin_edit(&mut self) -> Result<()>;

    /// Apply the open edit.
    fn commit_edit(&mut self) -> Result<()>;

    /// Discard the open edit.
    fn cancel_edit(&mut self) -> Result<()>;

    /// Called once before a traversal starts using the cursor.
    fn begin_traversal(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once when a traversal releases the cursor, on every exit path.
    fn end_traversal(&mut self) {}

    /// Whether a column with this name exists (case-insensitive).
    fn column_exists(&self, name: &str) -> bool {
        self.columns().find_by_name(name).is_some()
    }

    /// Declared type of a column.
    fn column_type(&self, name: &str) -> Option<DataType> {
        self.columns().column(name).map(|c| c.data_type)
    }

    /// Value of a column on the current row.
    fn value(&self, column: &str) -> Result<&Value> {
        self.current_row()?
            .get_by_name(column)
            .ok_or_else(|| Error::ColumnNotFound {
                name: column.to_string(),
            })
    }
}

/// Cursor over rows held in memory.
///
/// # Example
///
/// ```
/// use rowbind::{Column, Cursor, DataType, MemoryCursor, Value};
///
/// let mut cursor = MemoryCursor::new(vec![Column::new("NAME", DataType::Text)]);
/// cursor.push_row(vec![Value::Text("Argentina".into())])?;
///
/// assert_eq!(cursor.value("name")?, &Value::Text("Argentina".into()));
/// # Ok::<(), rowbind::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    /// Shared column information.
    column_info: Arc<ColumnInfo>,
    /// Stored rows.
    rows: Vec<Row>,
    /// Index of the current row; `rows.len()` means at end.
    position: usize,
    /// Pending edit of the current row.
    edit: Option<Row>,
    /// Traversals currently holding the cursor.
    open_traversals: usize,
}

impl MemoryCursor {
    /// Create an empty cursor with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            column_info: Arc::new(ColumnInfo::new(columns)),
            rows: Vec::new(),
            position: 0,
            edit: None,
            open_traversals: 0,
        }
    }

    /// Create a cursor and append `rows` to it.
    pub fn with_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut cursor = Self::new(columns);
        for values in rows {
            cursor.push_row(values)?;
        }
        Ok(cursor)
    }

    /// Append a row after validating it against the columns.
    ///
    /// The position is unchanged unless the cursor was at end, in which case
    /// it now sits on the appended row.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.column_info.len() {
            return Err(Error::RowArity {
                expected: self.column_info.len(),
                actual: values.len(),
            });
        }
        for (column, value) in self.column_info.columns.iter().zip(&values) {
            check_value(column, value)?;
        }
        self.rows
            .push(Row::new(values, Arc::clone(&self.column_info)));
        Ok(())
    }

    /// All stored rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the cursor holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the current row, `None` at end.
    pub fn position(&self) -> Option<usize> {
        (self.position < self.rows.len()).then_some(self.position)
    }

    /// Number of traversals that have begun and not yet ended.
    pub fn open_traversals(&self) -> usize {
        self.open_traversals
    }

    fn ensure_not_editing(&self) -> Result<()> {
        if self.edit.is_some() {
            return Err(Error::invalid_state(
                "commit or cancel the open edit before moving",
            ));
        }
        Ok(())
    }
}

impl Cursor for MemoryCursor {
    fn columns(&self) -> &ColumnInfo {
        &self.column_info
    }

    fn current_row(&self) -> Result<&Row> {
        if let Some(row) = &self.edit {
            return Ok(row);
        }
        self.rows
            .get(self.position)
            .ok_or_else(|| Error::invalid_state("cursor has no current row"))
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        let Some(row) = self.edit.as_mut() else {
            return Err(Error::invalid_state("current row is not in edit mode"));
        };
        let col = self
            .column_info
            .column(column)
            .ok_or_else(|| Error::ColumnNotFound {
                name: column.to_string(),
            })?;
        check_value(col, &value)?;
        row.set_by_name(column, value)
    }

    fn move_first(&mut self) -> Result<()> {
        self.ensure_not_editing()?;
        self.position = 0;
        Ok(())
    }

    fn move_next(&mut self) -> Result<()> {
        self.ensure_not_editing()?;
        if self.position < self.rows.len() {
            self.position += 1;
        }
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.rows.len()
    }

    fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    fn begin_edit(&mut self) -> Result<()> {
        if self.edit.is_none() {
            let row = self.current_row()?.clone();
            self.edit = Some(row);
        }
        Ok(())
    }

    fn commit_edit(&mut self) -> Result<()> {
        let row = self
            .edit
            .take()
            .ok_or_else(|| Error::invalid_state("no open edit to commit"))?;
        self.rows[self.position] = row;
        Ok(())
    }

    fn cancel_edit(&mut self) -> Result<()> {
        self.edit = None;
        Ok(())
    }

    fn begin_traversal(&mut self) -> Result<()> {
        self.open_traversals += 1;
        Ok(())
    }

    fn end_traversal(&mut self) {
        self.open_traversals = self.open_traversals.saturating_sub(1);
    }
}

/// Validate a value against a column's type and nullability.
fn check_value(column: &Column, value: &Value) -> Result<()> {
    match value.data_type() {
        None if !column.nullable => Err(Error::NullValue {
            column: column.name.clone(),
        }),
        None => Ok(()),
        Some(found) if found == column.data_type => Ok(()),
        Some(found) => Err(Error::TypeMismatch {
            column: column.name.clone(),
            member: None,
            source: ConvertError::Incompatible {
                found,
                expected: column.data_type,
            },
        }),
    }
}

/// Typed row access on any cursor through the process-wide [`Mapper`].
///
/// # Example
///
/// ```
/// use rowbind::{Column, CursorExt, DataType, Mapped, MemberDescriptor, MemoryCursor, Value};
///
/// #[derive(Debug, Default)]
/// struct Country {
///     name: String,
///     population: i64,
/// }
///
/// impl Mapped for Country {
///     fn members() -> Vec<MemberDescriptor<Self>> {
///         vec![
///             MemberDescriptor::field("Name", |c: &Self| &c.name, |c: &mut Self| &mut c.name),
///             MemberDescriptor::field(
///                 "Population",
///                 |c: &Self| &c.population,
///                 |c: &mut Self| &mut c.population,
///             ),
///         ]
///     }
/// }
///
/// let mut cursor = MemoryCursor::with_rows(
///     vec![
///         Column::new("NAME", DataType::Text),
///         Column::new("POPULATION", DataType::Integer),
///     ],
///     vec![
///         vec![Value::Text("Bolivia".into()), Value::Integer(7300000)],
///         vec![Value::Text("Chile".into()), Value::Integer(13200000)],
///     ],
/// )?;
///
/// let names = cursor
///     .rows_as::<Country>()?
///     .map(|c| c.map(|c| c.name))
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(names, ["Bolivia", "Chile"]);
/// # Ok::<(), rowbind::Error>(())
/// ```
pub trait CursorExt: Cursor {
    /// Read the current row as a new `T`.
    fn read_as<T: Mapped + Default>(&self) -> Result<T> {
        Mapper::global().read(self)
    }

    /// Read the current row into `instance`.
    fn read_into<T: Mapped>(&self, instance: &mut T) -> Result<()> {
        Mapper::global().read_into(self, instance)
    }

    /// Write `instance` into the current row, which must be in edit mode.
    fn write_from<T: Mapped>(&mut self, instance: &T) -> Result<()> {
        Mapper::global().write_from(self, instance)
    }

    /// Enumerate all rows as fresh instances of `T`.
    fn rows_as<T: Mapped + Default>(&mut self) -> Result<RowEnumerator<'_, Self, T, ByValue>> {
        Mapper::global().rows(self)
    }

    /// Enumerate all rows into `instance`, overwriting it at every step.
    fn rows_into<'i, T: Mapped>(
        &mut self,
        instance: &'i mut T,
    ) -> Result<RowEnumerator<'_, Self, T, InPlace<'i, T>>> {
        Mapper::global().rows_into(self, instance)
    }
}

impl<C: Cursor + ?Sized> CursorExt for C {}
