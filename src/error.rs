//! Error types for row mapping.

use thiserror::Error;

use crate::convert::ConvertError;
use crate::types::DataType;

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mapping and cursor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An explicitly named column does not exist on the cursor.
    #[error("{type_name}.{member}: column '{column}' does not exist on the cursor")]
    UnresolvedColumn {
        type_name: &'static str,
        member: String,
        column: String,
    },

    /// A manually mapped type ended up with no bound members.
    #[error("{type_name} uses manual mapping but no member is bound to a column")]
    EmptyManualMapping { type_name: &'static str },

    /// A value could not be converted between a column and a member.
    #[error("Type mismatch on column '{column}'{}: {source}", member_suffix(.member))]
    TypeMismatch {
        column: String,
        member: Option<String>,
        #[source]
        source: ConvertError,
    },

    /// A column's declared type can never be assigned to the member's type.
    #[error(
        "{type_name}.{member}: column '{column}' of type {column_type} cannot bind to a {member_type} member"
    )]
    IncompatibleColumn {
        type_name: &'static str,
        member: String,
        column: String,
        column_type: DataType,
        member_type: DataType,
    },

    /// The cursor is not in a state that allows the requested row access.
    #[error("Invalid cursor state: {message}")]
    InvalidCursorState { message: String },

    /// NULL read into, or written to, a place that cannot hold it.
    #[error("Unexpected NULL value in column {column}")]
    NullValue { column: String },

    /// Column not found on a row.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Row width does not match the column list.
    #[error("Row has {actual} values but the cursor has {expected} columns")]
    RowArity { expected: usize, actual: usize },

    /// Configuration value could not be understood.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The process-wide mapper was already created.
    #[error("Global mapper already initialized")]
    AlreadyInitialized,

    /// Failure reported by an external cursor implementation.
    #[error("Cursor error: {message}")]
    Cursor { message: String },
}

fn member_suffix(member: &Option<String>) -> String {
    member
        .as_deref()
        .map(|m| format!(" (member '{}')", m))
        .unwrap_or_default()
}

impl Error {
    /// Create an invalid cursor state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidCursorState {
            message: message.into(),
        }
    }

    /// Create an error on behalf of an external cursor.
    pub fn cursor(message: impl Into<String>) -> Self {
        Self::Cursor {
            message: message.into(),
        }
    }

    /// Whether this error is a type mismatch, detected at build time or per operation.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. } | Error::IncompatibleColumn { .. }
        )
    }
}
