//! Per-type resolved mapping.
//!
//! `TypeMetadata` is built once per type against the column set of the
//! first cursor it is used with, then shared read-only for the rest of the
//! process. Building walks the declared members in order, resolves each one
//! to a column (or excludes it) and checks that the column's declared type
//! can be read into the member.

use std::any::{type_name, TypeId};
use std::fmt;

use super::member::MemberDescriptor;
use super::resolver::{resolve_column, Resolution};
use super::{Mapped, MappingMode};
use crate::error::{Error, Result};
use crate::types::{ColumnInfo, DataType};

/// A member bound to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Member name.
    pub member: String,
    /// Column name as spelled by the cursor.
    pub column: String,
    /// Declared column type.
    pub column_type: DataType,
    /// Declared member type.
    pub member_type: DataType,
    /// Whether the column was named by an annotation.
    pub explicit: bool,
    /// Position of the member in declaration order.
    member_index: usize,
}

/// Cached mapping of one type's members to columns.
pub struct TypeMetadata<T> {
    owner_type: &'static str,
    type_id: TypeId,
    mode: MappingMode,
    members: Vec<MemberDescriptor<T>>,
    bindings: Vec<Binding>,
}

impl<T: Mapped> TypeMetadata<T> {
    /// Build the metadata of `T` from its declared members.
    pub fn build(mode: MappingMode, columns: &ColumnInfo) -> Result<Self> {
        Self::from_members(mode, T::members(), columns)
    }
}

impl<T: 'static> TypeMetadata<T> {
    /// Build metadata from an explicit member list.
    pub fn from_members(
        mode: MappingMode,
        members: Vec<MemberDescriptor<T>>,
        columns: &ColumnInfo,
    ) -> Result<Self> {
        let owner_type = type_name::<T>();
        let mut bindings = Vec::new();

        for (member_index, member) in members.iter().enumerate() {
            let resolution = resolve_column(member.name(), member.annotation(), mode);
            let Some(requested) = resolution.column() else {
                continue;
            };

            let Some(column) = columns.column(requested) else {
                if let Resolution::Explicit(column) = resolution {
                    return Err(Error::UnresolvedColumn {
                        type_name: owner_type,
                        member: member.name().to_string(),
                        column,
                    });
                }
                continue;
            };

            if !column.data_type.can_read_as(member.declared_type()) {
                return Err(Error::IncompatibleColumn {
                    type_name: owner_type,
                    member: member.name().to_string(),
                    column: column.name.clone(),
                    column_type: column.data_type,
                    member_type: member.declared_type(),
                });
            }

            bindings.push(Binding {
                member: member.name().to_string(),
                column: column.name.clone(),
                column_type: column.data_type,
                member_type: member.declared_type(),
                explicit: resolution.is_explicit(),
                member_index,
            });
        }

        if mode == MappingMode::Manual && bindings.is_empty() {
            return Err(Error::EmptyManualMapping {
                type_name: owner_type,
            });
        }

        Ok(Self {
            owner_type,
            type_id: TypeId::of::<T>(),
            mode,
            members,
            bindings,
        })
    }
}

impl<T> TypeMetadata<T> {
    /// Name of the mapped type.
    pub fn owner_type(&self) -> &'static str {
        self.owner_type
    }

    /// Identity of the mapped type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Mapping mode the type was built with.
    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    /// All declared members, bound or not.
    pub fn members(&self) -> &[MemberDescriptor<T>] {
        &self.members
    }

    /// Bound members, in declaration order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of bound members.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no member is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Column bound to the named member.
    pub fn column_for(&self, member: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.member == member)
            .map(|b| b.column.as_str())
    }

    /// `(member, column)` pairs of every binding.
    pub fn resolved_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|b| (b.member.as_str(), b.column.as_str()))
    }

    pub(crate) fn member(&self, binding: &Binding) -> &MemberDescriptor<T> {
        &self.members[binding.member_index]
    }
}

impl<T> fmt::Debug for TypeMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("owner_type", &self.owner_type)
            .field("mode", &self.mode)
            .field("members", &self.members)
            .field("bindings", &self.bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    #[derive(Debug, Default)]
    struct Customer {
        cust_no: i32,
        cust_no_raw: f64,
        company: String,
        notes: String,
    }

    fn members() -> Vec<MemberDescriptor<Customer>> {
        vec![
            MemberDescriptor::field(
                "CustNo",
                |c: &Customer| &c.cust_no,
                |c: &mut Customer| &mut c.cust_no,
            )
            .skip(),
            MemberDescriptor::field(
                "cust_no_raw",
                |c: &Customer| &c.cust_no_raw,
                |c: &mut Customer| &mut c.cust_no_raw,
            )
            .column("CUSTNO"),
            MemberDescriptor::field(
                "company",
                |c: &Customer| &c.company,
                |c: &mut Customer| &mut c.company,
            ),
            MemberDescriptor::field(
                "notes",
                |c: &Customer| &c.notes,
                |c: &mut Customer| &mut c.notes,
            ),
        ]
    }

    fn columns() -> ColumnInfo {
        ColumnInfo::new(vec![
            Column::new("CustNo", DataType::Float),
            Column::new("Company", DataType::Text),
        ])
    }

    #[test]
    fn test_auto_binds_matching_names() {
        let metadata =
            TypeMetadata::from_members(MappingMode::Auto, members(), &columns()).unwrap();

        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.members().len(), 4);
        assert_eq!(metadata.column_for("cust_no_raw"), Some("CustNo"));
        assert_eq!(metadata.column_for("company"), Some("Company"));
        assert_eq!(metadata.column_for("CustNo"), None);
        assert_eq!(metadata.column_for("notes"), None);
        assert!(metadata.bindings()[0].explicit);
        assert!(!metadata.bindings()[1].explicit);
        assert!(metadata.owner_type().ends_with("Customer"));
    }

    #[test]
    fn test_manual_binds_annotated_only() {
        let metadata =
            TypeMetadata::from_members(MappingMode::Manual, members(), &columns()).unwrap();

        let pairs: Vec<_> = metadata.resolved_columns().collect();
        assert_eq!(pairs, vec![("cust_no_raw", "CustNo")]);
    }

    #[test]
    fn test_manual_without_bindings_fails() {
        let members = vec![MemberDescriptor::field(
            "company",
            |c: &Customer| &c.company,
            |c: &mut Customer| &mut c.company,
        )];
        let err = TypeMetadata::from_members(MappingMode::Manual, members, &columns()).unwrap_err();
        assert!(matches!(err, Error::EmptyManualMapping { .. }));
    }

    #[test]
    fn test_unresolved_explicit_column() {
        let members = vec![MemberDescriptor::field(
            "company",
            |c: &Customer| &c.company,
            |c: &mut Customer| &mut c.company,
        )
        .column("COMPANY_NAME")];
        let err = TypeMetadata::from_members(MappingMode::Auto, members, &columns()).unwrap_err();
        match err {
            Error::UnresolvedColumn { member, column, .. } => {
                assert_eq!(member, "company");
                assert_eq!(column, "COMPANY_NAME");
            }
            other => panic!("Expected UnresolvedColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_float_column_rejects_integer_member() {
        let members = vec![MemberDescriptor::field(
            "CustNo",
            |c: &Customer| &c.cust_no,
            |c: &mut Customer| &mut c.cust_no,
        )];
        let err = TypeMetadata::from_members(MappingMode::Auto, members, &columns()).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompatibleColumn {
                column_type: DataType::Float,
                member_type: DataType::Integer,
                ..
            }
        ));
    }
}
