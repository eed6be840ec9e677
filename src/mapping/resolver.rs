//! Member name to column name resolution.

use super::MappingMode;

/// Per-member mapping annotation.
///
/// Renaming the target column and excluding the member are separate
/// annotations; a member carries at most one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnAnnotation {
    /// Bind to this column instead of the member's own name.
    Column(String),
    /// Never bind this member.
    Skip,
}

/// Outcome of resolving one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Explicitly annotated column. Must exist on the cursor.
    Explicit(String),
    /// Column proposed from the member name. Binds only if it exists.
    Derived(String),
    /// Member does not participate.
    Skip,
}

impl Resolution {
    /// Proposed column name, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Resolution::Explicit(name) | Resolution::Derived(name) => Some(name),
            Resolution::Skip => None,
        }
    }

    /// Whether the column was named explicitly.
    pub fn is_explicit(&self) -> bool {
        matches!(self, Resolution::Explicit(_))
    }
}

/// Decide which column, if any, a member binds to.
pub fn resolve_column(
    member: &str,
    annotation: Option<&ColumnAnnotation>,
    mode: MappingMode,
) -> Resolution {
    match (annotation, mode) {
        (Some(ColumnAnnotation::Column(column)), _) => Resolution::Explicit(column.clone()),
        (Some(ColumnAnnotation::Skip), _) => Resolution::Skip,
        (None, MappingMode::Auto) => Resolution::Derived(member.to_string()),
        (None, MappingMode::Manual) => Resolution::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_column_wins() {
        let annotation = ColumnAnnotation::Column("CustNo".to_string());
        for mode in [MappingMode::Auto, MappingMode::Manual] {
            let resolution = resolve_column("cust_no_raw", Some(&annotation), mode);
            assert_eq!(resolution, Resolution::Explicit("CustNo".to_string()));
            assert!(resolution.is_explicit());
        }
    }

    #[test]
    fn test_skip_ignores_mode() {
        for mode in [MappingMode::Auto, MappingMode::Manual] {
            let resolution = resolve_column("CustNo", Some(&ColumnAnnotation::Skip), mode);
            assert_eq!(resolution, Resolution::Skip);
            assert_eq!(resolution.column(), None);
        }
    }

    #[test]
    fn test_unannotated_by_mode() {
        assert_eq!(
            resolve_column("LastName", None, MappingMode::Auto),
            Resolution::Derived("LastName".to_string())
        );
        assert_eq!(
            resolve_column("LastName", None, MappingMode::Manual),
            Resolution::Skip
        );
    }
}
