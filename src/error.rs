use std::fmt::Display;

use thiserror::Error;

/// Errors produced by the driver.
///
/// Engine-reported failures carry the native SQLite result code and the
/// message read from `sqlite3_errmsg` at the time of the failure.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// The database file or URI could not be opened.
    #[error("unable to open database ({code}): {message}")]
    Open { code: i32, message: String },
    /// The statement text failed to compile.
    #[error("syntax error ({code}): {message}")]
    Syntax { code: i32, message: String },
    /// Parameter arity mismatch, or a value could not be bound to its slot.
    #[error("bind error: {message}")]
    Bind { message: String },
    /// The engine failed while stepping a statement (constraint violation,
    /// I/O failure, busy/locked).
    #[error("step error ({code}): {message}")]
    Step { code: i32, message: String },
    /// The application value has no SQLite representation.
    #[error("unsupported type: {type_name} has no sqlite representation")]
    UnsupportedType { type_name: String },
    /// No defined conversion between the stored value and the target type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },
    /// No column matched the requested (name, table, occurrence).
    #[error("column not found: {column}")]
    ColumnNotFound { column: String },
    /// The requested table qualifies none of the row's columns.
    #[error("invalid table: {0}")]
    InvalidTable(String),
    /// The connection was closed by the caller.
    #[error("connection is closed")]
    ConnectionClosed,
    /// Codec failure reported through serde.
    #[error("codec error: {0}")]
    Codec(String),
}

impl serde::ser::Error for SqliteError {
    fn custom<T: Display>(msg: T) -> Self {
        SqliteError::Codec(msg.to_string())
    }
}

impl serde::de::Error for SqliteError {
    fn custom<T: Display>(msg: T) -> Self {
        SqliteError::Codec(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        SqliteError::ColumnNotFound {
            column: field.to_string(),
        }
    }
}
