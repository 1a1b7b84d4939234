use serde::Serialize;

use crate::error::SqliteError;
use crate::value::SqliteValue;

/// A serialized query: final SQL text plus its ordered bind values.
///
/// This is the full contract with the upstream query builder. Bind values
/// are positional; the engine binds them to 1-indexed parameter slots in
/// the order they were added.
#[derive(Debug, Clone)]
pub struct SqliteQuery {
    sql: String,
    binds: Vec<SqliteValue>,
}

impl SqliteQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Append a bind value.
    pub fn bind(mut self, value: impl Into<SqliteValue>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Encode and append a bind value.
    ///
    /// Fails with `UnsupportedType` before the query ever reaches a
    /// connection.
    pub fn encode_bind<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, SqliteError> {
        self.binds.push(SqliteValue::encode(value)?);
        Ok(self)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[SqliteValue] {
        &self.binds
    }

    pub(crate) fn into_parts(self) -> (String, Vec<SqliteValue>) {
        (self.sql, self.binds)
    }
}

impl From<&str> for SqliteQuery {
    fn from(sql: &str) -> Self {
        SqliteQuery::new(sql)
    }
}

impl From<String> for SqliteQuery {
    fn from(sql: String) -> Self {
        SqliteQuery::new(sql)
    }
}
