//! Forward-only enumeration of cursor rows as typed instances.
//!
//! A `RowEnumerator` holds the cursor's only mutable borrow for its whole
//! life, so two traversals can never interleave on one cursor. Requesting a
//! new enumerator after the previous one is dropped starts again from the
//! first row.
//!
//! # State machine
//!
//! ```text
//! NotStarted --first step, rows--> Positioned --step--> Positioned
//!      |                               |
//!      +--first step, no rows--+       +--step at end / error--+
//!                              v                               v
//!                          Exhausted <-------------------------+
//! ```
//!
//! Each step moves the cursor first (to the first row on the initial step,
//! to the next row afterwards) and then materializes the row it landed on.
//! Between steps the cursor stays on the row that was just yielded.

use std::iter::FusedIterator;

use tracing::trace;

use crate::accessor::RowAccessor;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::mapping::Mapped;

/// Enumeration progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumState {
    /// No step taken yet; the cursor has not been touched.
    NotStarted,
    /// The cursor is on the most recently yielded row.
    Positioned,
    /// No further rows will be produced.
    Exhausted,
}

/// How a row becomes an enumerator output.
pub trait Materialize<T> {
    /// Value produced for each row.
    type Output<'a>
    where
        Self: 'a;

    /// Produce the output for the cursor's current row.
    fn materialize<'a, C: Cursor + ?Sized>(
        &'a mut self,
        accessor: &RowAccessor<T>,
        cursor: &C,
    ) -> Result<Self::Output<'a>>;
}

/// Produce a fresh `T` per row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByValue;

impl<T: Mapped + Default> Materialize<T> for ByValue {
    type Output<'a> = T;

    fn materialize<'a, C: Cursor + ?Sized>(
        &'a mut self,
        accessor: &RowAccessor<T>,
        cursor: &C,
    ) -> Result<T> {
        accessor.read(cursor)
    }
}

/// Read every row into one caller-supplied instance.
///
/// Each step overwrites the same instance and yields a reference to it, so
/// after a step the instance holds that row's values and nothing of the
/// previous row's. Callers that need a row after the next step must copy it
/// out first. Members not bound to a column keep whatever value they had.
#[derive(Debug)]
pub struct InPlace<'i, T> {
    instance: &'i mut T,
}

impl<'i, T> InPlace<'i, T> {
    /// Wrap the instance to read rows into.
    pub fn new(instance: &'i mut T) -> Self {
        Self { instance }
    }
}

impl<'i, T: Mapped> Materialize<T> for InPlace<'i, T> {
    type Output<'a> = &'a T
    where
        Self: 'a;

    fn materialize<'a, C: Cursor + ?Sized>(
        &'a mut self,
        accessor: &RowAccessor<T>,
        cursor: &C,
    ) -> Result<&'a T> {
        accessor.read_into(cursor, self.instance)?;
        Ok(&*self.instance)
    }
}

/// Lazy, forward-only sequence of typed rows over a borrowed cursor.
///
/// With [`ByValue`] this is an `Iterator<Item = Result<T>>`. With
/// [`InPlace`] use [`RowEnumerator::next_row`], which lends the shared
/// instance until the next step:
///
/// ```
/// use rowbind::{Column, DataType, Mapped, Mapper, MemberDescriptor, MemoryCursor, Value};
///
/// #[derive(Debug, Default)]
/// struct Reading {
///     celsius: f64,
/// }
///
/// impl Mapped for Reading {
///     fn members() -> Vec<MemberDescriptor<Self>> {
///         vec![MemberDescriptor::field(
///             "Celsius",
///             |r: &Self| &r.celsius,
///             |r: &mut Self| &mut r.celsius,
///         )]
///     }
/// }
///
/// let mut cursor = MemoryCursor::with_rows(
///     vec![Column::new("CELSIUS", DataType::Float)],
///     vec![vec![Value::Float(21.5)], vec![Value::Float(23.0)]],
/// )?;
///
/// let mapper = Mapper::default();
/// let mut reading = Reading::default();
/// let mut max = f64::MIN;
/// let mut rows = mapper.rows_into(&mut cursor, &mut reading)?;
/// while let Some(row) = rows.next_row() {
///     max = max.max(row?.celsius);
/// }
/// drop(rows);
///
/// assert_eq!(max, 23.0);
/// assert_eq!(reading.celsius, 23.0);
/// # Ok::<(), rowbind::Error>(())
/// ```
pub struct RowEnumerator<'c, C: Cursor + ?Sized, T, M> {
    cursor: &'c mut C,
    accessor: RowAccessor<T>,
    materializer: M,
    state: EnumState,
    traversing: bool,
}

impl<'c, C: Cursor + ?Sized, T: Mapped, M: Materialize<T>> RowEnumerator<'c, C, T, M> {
    /// Create an enumerator. The cursor is not touched until the first step.
    pub fn new(cursor: &'c mut C, accessor: RowAccessor<T>, materializer: M) -> Self {
        Self {
            cursor,
            accessor,
            materializer,
            state: EnumState::NotStarted,
            traversing: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> EnumState {
        self.state
    }

    /// Accessor used to materialize rows.
    pub fn accessor(&self) -> &RowAccessor<T> {
        &self.accessor
    }

    /// The underlying cursor, positioned on the last yielded row.
    pub fn cursor(&self) -> &C {
        &*self.cursor
    }

    /// Mutable access to the underlying cursor, e.g. to edit the row just
    /// yielded. Any open edit must be committed or cancelled before the
    /// next step.
    pub fn cursor_mut(&mut self) -> &mut C {
        &mut *self.cursor
    }

    /// Advance and materialize the next row.
    ///
    /// Returns `None` once the cursor is exhausted. An error is returned
    /// once and ends the enumeration.
    pub fn next_row(&mut self) -> Option<Result<M::Output<'_>>> {
        match self.advance() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                self.set_state(EnumState::Exhausted);
                return Some(Err(err));
            }
        }

        match self.materializer.materialize(&self.accessor, &*self.cursor) {
            Ok(item) => Some(Ok(item)),
            Err(err) => {
                self.state = EnumState::Exhausted;
                trace!(state = ?self.state, "Row enumeration stopped on error");
                Some(Err(err))
            }
        }
    }

    /// Move the cursor for the next step. `Ok(true)` when on a row.
    fn advance(&mut self) -> Result<bool> {
        match self.state {
            EnumState::Exhausted => return Ok(false),
            EnumState::NotStarted => {
                self.cursor.begin_traversal()?;
                self.traversing = true;
                self.cursor.move_first()?;
            }
            EnumState::Positioned => self.cursor.move_next()?,
        }

        if self.cursor.is_at_end() {
            self.set_state(EnumState::Exhausted);
            Ok(false)
        } else {
            self.set_state(EnumState::Positioned);
            Ok(true)
        }
    }

    fn set_state(&mut self, state: EnumState) {
        if self.state != state {
            trace!(from = ?self.state, to = ?state, "Row enumerator transition");
            self.state = state;
        }
    }
}

impl<'c, C: Cursor + ?Sized, T: Mapped + Default> Iterator for RowEnumerator<'c, C, T, ByValue> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}

impl<'c, C: Cursor + ?Sized, T: Mapped + Default> FusedIterator
    for RowEnumerator<'c, C, T, ByValue>
{
}

impl<'c, C: Cursor + ?Sized, T, M> Drop for RowEnumerator<'c, C, T, M> {
    fn drop(&mut self) {
        if self.traversing {
            self.traversing = false;
            self.cursor.end_traversal();
        }
    }
}

impl<'c, C: Cursor + ?Sized, T, M> std::fmt::Debug for RowEnumerator<'c, C, T, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowEnumerator")
            .field("state", &self.state)
            .field("traversing", &self.traversing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MemoryCursor;
    use crate::error::Error;
    use crate::mapping::{Mapper, MemberDescriptor};
    use crate::types::{Column, DataType, Value};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Vendor {
        vendor_no: i64,
        name: String,
    }

    impl Mapped for Vendor {
        fn members() -> Vec<MemberDescriptor<Self>> {
            vec![
                MemberDescriptor::field(
                    "VendorNo",
                    |v: &Self| &v.vendor_no,
                    |v: &mut Self| &mut v.vendor_no,
                ),
                MemberDescriptor::field("Name", |v: &Self| &v.name, |v: &mut Self| &mut v.name),
            ]
        }
    }

    fn vendor(no: i64, name: &str) -> Vendor {
        Vendor {
            vendor_no: no,
            name: name.to_string(),
        }
    }

    fn vendors(rows: &[(i64, &str)]) -> MemoryCursor {
        MemoryCursor::with_rows(
            vec![
                Column::new("VENDORNO", DataType::Integer),
                Column::new("NAME", DataType::Text),
            ],
            rows.iter()
                .map(|(no, name)| vec![Value::Integer(*no), Value::Text(name.to_string())])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_cursor() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[]);
        let mut rows = mapper.rows::<Vendor, _>(&mut cursor).unwrap();

        assert_eq!(rows.state(), EnumState::NotStarted);
        assert!(rows.next().is_none());
        assert_eq!(rows.state(), EnumState::Exhausted);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_yields_rows_in_order() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[(2014, "Cacor"), (2641, "Techniques"), (2674, "Divers")]);

        let rows: Vec<Vendor> = mapper
            .rows::<Vendor, _>(&mut cursor)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            rows,
            vec![
                vendor(2014, "Cacor"),
                vendor(2641, "Techniques"),
                vendor(2674, "Divers"),
            ]
        );
    }

    #[test]
    fn test_starts_from_first_row() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[(1, "a"), (2, "b")]);
        cursor.move_next().unwrap();

        let mut rows = mapper.rows::<Vendor, _>(&mut cursor).unwrap();
        assert_eq!(rows.next().unwrap().unwrap().vendor_no, 1);
        assert_eq!(rows.state(), EnumState::Positioned);
        assert_eq!(rows.cursor().position(), Some(0));
    }

    #[test]
    fn test_exhausted_does_not_restart() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[(1, "a")]);
        let mut rows = mapper.rows::<Vendor, _>(&mut cursor).unwrap();

        assert!(rows.next().is_some());
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
        assert_eq!(rows.state(), EnumState::Exhausted);
        drop(rows);

        let again: Vec<_> = mapper.rows::<Vendor, _>(&mut cursor).unwrap().collect();
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_in_place_aliases_instance() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[(1, "first"), (2, "second"), (3, "third")]);
        let mut shared = Vendor::default();

        let mut rows = mapper.rows_into(&mut cursor, &mut shared).unwrap();
        let first = rows.next_row().unwrap().unwrap().clone();
        let second = rows.next_row().unwrap().unwrap();
        assert_eq!(second, &vendor(2, "second"));
        drop(rows);

        assert_eq!(first, vendor(1, "first"));
        assert_eq!(shared, vendor(2, "second"));
    }

    #[test]
    fn test_traversal_released_on_early_exit() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[(1, "a"), (2, "b"), (3, "c")]);

        {
            let mut rows = mapper.rows::<Vendor, _>(&mut cursor).unwrap();
            assert_eq!(rows.cursor().open_traversals(), 0);
            for row in rows.by_ref() {
                if row.unwrap().vendor_no == 2 {
                    break;
                }
            }
            assert_eq!(rows.cursor().open_traversals(), 1);
        }
        assert_eq!(cursor.open_traversals(), 0);

        let untouched = mapper.rows::<Vendor, _>(&mut cursor).unwrap();
        drop(untouched);
        assert_eq!(cursor.open_traversals(), 0);
    }

    #[test]
    fn test_error_ends_enumeration() {
        #[derive(Debug, Default)]
        struct Narrow {
            vendor_no: i8,
        }

        impl Mapped for Narrow {
            fn members() -> Vec<MemberDescriptor<Self>> {
                vec![MemberDescriptor::field(
                    "VendorNo",
                    |n: &Self| &n.vendor_no,
                    |n: &mut Self| &mut n.vendor_no,
                )]
            }
        }

        let mapper = Mapper::default();
        let mut cursor = vendors(&[(1, "a"), (1000, "b"), (3, "c")]);
        let mut rows = mapper.rows::<Narrow, _>(&mut cursor).unwrap();

        assert_eq!(rows.next().unwrap().unwrap().vendor_no, 1);
        assert!(matches!(
            rows.next(),
            Some(Err(Error::TypeMismatch { .. }))
        ));
        assert_eq!(rows.state(), EnumState::Exhausted);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_edit_through_enumerator() {
        let mapper = Mapper::default();
        let mut cursor = vendors(&[(1, "a"), (2, "b")]);
        let accessor = mapper.accessor::<Vendor, _>(&cursor).unwrap();

        let mut rows = mapper.rows::<Vendor, _>(&mut cursor).unwrap();
        while let Some(row) = rows.next() {
            let mut vendor = row.unwrap();
            vendor.name = vendor.name.to_uppercase();
            let cursor = rows.cursor_mut();
            cursor.begin_edit().unwrap();
            accessor.write_from(cursor, &vendor).unwrap();
            cursor.commit_edit().unwrap();
        }
        drop(rows);

        assert_eq!(cursor.rows()[0].get(1), Some(&Value::Text("A".into())));
        assert_eq!(cursor.rows()[1].get(1), Some(&Value::Text("B".into())));
    }
}
