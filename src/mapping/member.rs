//! Member descriptors: name, declared type, annotation and accessor pair.

use std::fmt;

use super::resolver::ColumnAnnotation;
use crate::convert::{ColumnValue, ConvertError};
use crate::types::{DataType, Value};

type Getter<T> = Box<dyn Fn(&T) -> Result<Value, ConvertError> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), ConvertError> + Send + Sync>;

/// One gettable/settable member of a mapped type.
///
/// Built with [`MemberDescriptor::field`] for plain record fields (and
/// backing fields bound directly) or [`MemberDescriptor::property`] for
/// getter/setter pairs.
pub struct MemberDescriptor<T> {
    name: String,
    declared_type: DataType,
    annotation: Option<ColumnAnnotation>,
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T: 'static> MemberDescriptor<T> {
    /// Describe a field through shared and mutable projections.
    ///
    /// ```
    /// use rowbind::MemberDescriptor;
    ///
    /// #[derive(Default)]
    /// struct Employee {
    ///     emp_no: i32,
    /// }
    ///
    /// let member = MemberDescriptor::field(
    ///     "EmpNo",
    ///     |e: &Employee| &e.emp_no,
    ///     |e: &mut Employee| &mut e.emp_no,
    /// );
    /// assert_eq!(member.name(), "EmpNo");
    /// ```
    pub fn field<V, G, M>(name: impl Into<String>, get: G, get_mut: M) -> Self
    where
        V: ColumnValue + 'static,
        G: for<'a> Fn(&'a T) -> &'a V + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut T) -> &'a mut V + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declared_type: V::DATA_TYPE,
            annotation: None,
            getter: Box::new(move |instance| get(instance).to_value()),
            setter: Box::new(move |instance, value| {
                *get_mut(instance) = V::from_value(value)?;
                Ok(())
            }),
        }
    }

    /// Describe a read/write property through a getter and a setter.
    pub fn property<V, G, S>(name: impl Into<String>, getter: G, setter: S) -> Self
    where
        V: ColumnValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declared_type: V::DATA_TYPE,
            annotation: None,
            getter: Box::new(move |instance| getter(instance).to_value()),
            setter: Box::new(move |instance, value| {
                setter(instance, V::from_value(value)?);
                Ok(())
            }),
        }
    }
}

impl<T> MemberDescriptor<T> {
    /// Bind to an explicitly named column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.annotation = Some(ColumnAnnotation::Column(column.into()));
        self
    }

    /// Exclude this member from mapping in every mode.
    pub fn skip(mut self) -> Self {
        self.annotation = Some(ColumnAnnotation::Skip);
        self
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared member type.
    pub fn declared_type(&self) -> DataType {
        self.declared_type
    }

    /// Attached annotation, if any.
    pub fn annotation(&self) -> Option<&ColumnAnnotation> {
        self.annotation.as_ref()
    }

    /// Explicit column name, if annotated with one.
    pub fn explicit_column(&self) -> Option<&str> {
        match &self.annotation {
            Some(ColumnAnnotation::Column(column)) => Some(column),
            _ => None,
        }
    }

    /// Whether the member carries the skip marker.
    pub fn is_skipped(&self) -> bool {
        matches!(self.annotation, Some(ColumnAnnotation::Skip))
    }

    /// Read the member as a column value of its declared type.
    pub(crate) fn get(&self, instance: &T) -> Result<Value, ConvertError> {
        (self.getter)(instance)
    }

    /// Assign a column value to the member.
    pub(crate) fn set(&self, instance: &mut T, value: Value) -> Result<(), ConvertError> {
        (self.setter)(instance, value)
    }
}

impl<T> fmt::Debug for MemberDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("annotation", &self.annotation)
            .finish_non_exhaustive()
    }
}
