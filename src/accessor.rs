//! Reading and writing mapped instances at the cursor's current row.
//!
//! The accessor never moves the cursor. Reads touch only the target
//! instance; writes touch only the current row and require the caller to
//! have opened an edit on it.

use std::sync::Arc;

use crate::convert::ConvertError;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::mapping::{Binding, Mapped, TypeMetadata};

/// Reads rows into, and writes rows from, instances of `T`.
pub struct RowAccessor<T> {
    metadata: Arc<TypeMetadata<T>>,
}

impl<T: Mapped> RowAccessor<T> {
    /// Create an accessor over already-built metadata.
    pub fn new(metadata: Arc<TypeMetadata<T>>) -> Self {
        Self { metadata }
    }

    /// Metadata this accessor maps with.
    pub fn metadata(&self) -> &TypeMetadata<T> {
        &self.metadata
    }

    /// Materialize the current row as a new instance.
    pub fn read<C: Cursor + ?Sized>(&self, cursor: &C) -> Result<T>
    where
        T: Default,
    {
        let mut instance = T::default();
        self.read_into(cursor, &mut instance)?;
        Ok(instance)
    }

    /// Assign every bound member of `instance` from the current row.
    ///
    /// Unbound members are left untouched. On error, members assigned
    /// before the failing one keep their new values.
    pub fn read_into<C: Cursor + ?Sized>(&self, cursor: &C, instance: &mut T) -> Result<()> {
        let row = cursor.current_row()?;
        for binding in self.metadata.bindings() {
            let value = row
                .get_by_name(&binding.column)
                .cloned()
                .ok_or_else(|| Error::ColumnNotFound {
                    name: binding.column.clone(),
                })?;
            self.metadata
                .member(binding)
                .set(instance, value)
                .map_err(|source| conversion_error(binding, source))?;
        }
        Ok(())
    }

    /// Write every bound member of `instance` into the current row.
    ///
    /// The cursor must be inside an edit; opening and committing it is the
    /// caller's job.
    pub fn write_from<C: Cursor + ?Sized>(&self, cursor: &mut C, instance: &T) -> Result<()> {
        if !cursor.is_editing() {
            return Err(Error::invalid_state(
                "writing a row requires the cursor to be in edit mode",
            ));
        }
        for binding in self.metadata.bindings() {
            let value = self
                .metadata
                .member(binding)
                .get(instance)
                .and_then(|value| value.coerce_to(binding.column_type))
                .map_err(|source| conversion_error(binding, source))?;
            cursor.set_value(&binding.column, value)?;
        }
        Ok(())
    }
}

impl<T> Clone for RowAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
        }
    }
}

impl<T> std::fmt::Debug for RowAccessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowAccessor")
            .field("metadata", &self.metadata)
            .finish()
    }
}

fn conversion_error(binding: &Binding, source: ConvertError) -> Error {
    match source {
        ConvertError::Null => Error::NullValue {
            column: binding.column.clone(),
        },
        source => Error::TypeMismatch {
            column: binding.column.clone(),
            member: Some(binding.member.clone()),
            source,
        },
    }
}
