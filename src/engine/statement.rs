use std::ffi::{c_int, c_void, CString};
use std::ptr;

use libsqlite3_sys as ffi;

use crate::engine::{read_cstr, EngineHandle};
use crate::error::SqliteError;
use crate::row::{resolve_columns, SqliteColumn, SqliteRow};
use crate::value::SqliteValue;

/// One prepared statement, alive for a single query execution.
///
/// Drives the engine's statement lifecycle: prepare, bind, step, extract.
/// The first step happens inside [`SqliteStatement::columns`]; a statement
/// producing no result set is thereby fully executed there. Only one
/// `next_row` may be in flight at a time, which the owning worker enforces
/// by construction. Finalized on drop.
#[derive(Debug)]
pub(crate) struct SqliteStatement<'conn> {
    raw: *mut ffi::sqlite3_stmt,
    handle: &'conn EngineHandle,
    has_row: bool,
}

impl<'conn> SqliteStatement<'conn> {
    /// Compile the statement text.
    pub(crate) fn prepare(handle: &'conn EngineHandle, sql: &str) -> Result<Self, SqliteError> {
        let text = CString::new(sql).map_err(|_| SqliteError::Syntax {
            code: ffi::SQLITE_MISUSE,
            message: "statement contains an interior nul byte".to_string(),
        })?;
        let mut raw = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(handle.raw(), text.as_ptr(), -1, &mut raw, ptr::null_mut())
        };
        if rc != ffi::SQLITE_OK {
            return Err(SqliteError::Syntax {
                code: handle.error_code(),
                message: handle.error_message(),
            });
        }
        if raw.is_null() {
            return Err(SqliteError::Syntax {
                code: rc,
                message: "query contains no statement".to_string(),
            });
        }
        Ok(Self {
            raw,
            handle,
            has_row: false,
        })
    }

    /// Bind each value to its 1-indexed parameter slot.
    ///
    /// The whole binding fails before any step when the arity does not match
    /// the statement's declared parameter count.
    pub(crate) fn bind(&mut self, values: Vec<SqliteValue>) -> Result<(), SqliteError> {
        let expected = unsafe { ffi::sqlite3_bind_parameter_count(self.raw) };
        if expected as usize != values.len() {
            return Err(SqliteError::Bind {
                message: format!(
                    "statement declares {expected} parameters, {} values bound",
                    values.len()
                ),
            });
        }
        for (position, value) in values.into_iter().enumerate() {
            let slot = position as c_int + 1;
            let rc = match value {
                SqliteValue::Null => unsafe { ffi::sqlite3_bind_null(self.raw, slot) },
                SqliteValue::Integer(v) => unsafe { ffi::sqlite3_bind_int64(self.raw, slot, v) },
                SqliteValue::Real(v) => unsafe { ffi::sqlite3_bind_double(self.raw, slot, v) },
                SqliteValue::Text(v) => {
                    let len = c_int::try_from(v.len()).map_err(|_| SqliteError::Bind {
                        message: format!("text value for parameter {slot} is too large"),
                    })?;
                    unsafe {
                        ffi::sqlite3_bind_text(
                            self.raw,
                            slot,
                            v.as_ptr() as *const _,
                            len,
                            ffi::SQLITE_TRANSIENT(),
                        )
                    }
                }
                SqliteValue::Blob(v) => {
                    let len = c_int::try_from(v.len()).map_err(|_| SqliteError::Bind {
                        message: format!("blob value for parameter {slot} is too large"),
                    })?;
                    unsafe {
                        ffi::sqlite3_bind_blob(
                            self.raw,
                            slot,
                            v.as_ptr() as *const c_void,
                            len,
                            ffi::SQLITE_TRANSIENT(),
                        )
                    }
                }
            };
            if rc != ffi::SQLITE_OK {
                return Err(SqliteError::Bind {
                    message: self.handle.error_message(),
                });
            }
        }
        Ok(())
    }

    /// Resolve the statement's output columns, performing the first step.
    ///
    /// Returns `None` for statements producing no result set; those are
    /// fully executed by the time this returns.
    pub(crate) fn columns(&mut self) -> Result<Option<Vec<SqliteColumn>>, SqliteError> {
        self.has_row = self.step()?;
        let count = unsafe { ffi::sqlite3_column_count(self.raw) };
        if count == 0 {
            return Ok(None);
        }
        let mut raw_columns = Vec::with_capacity(count as usize);
        for index in 0..count {
            let name = read_cstr(unsafe { ffi::sqlite3_column_name(self.raw, index) })
                .unwrap_or_default();
            let table = read_cstr(unsafe { ffi::sqlite3_column_table_name(self.raw, index) });
            raw_columns.push((table, name));
        }
        Ok(Some(resolve_columns(raw_columns)))
    }

    /// Materialize the current row and advance, `None` at end of results.
    pub(crate) fn next_row(
        &mut self,
        columns: &[SqliteColumn],
    ) -> Result<Option<SqliteRow>, SqliteError> {
        if !self.has_row {
            return Ok(None);
        }
        let mut row = SqliteRow::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            row.insert(column.clone(), self.column_value(index as c_int));
        }
        self.has_row = self.step()?;
        Ok(Some(row))
    }

    fn step(&mut self) -> Result<bool, SqliteError> {
        match unsafe { ffi::sqlite3_step(self.raw) } {
            ffi::SQLITE_ROW => Ok(true),
            ffi::SQLITE_DONE => Ok(false),
            _ => Err(SqliteError::Step {
                code: self.handle.error_code(),
                message: self.handle.error_message(),
            }),
        }
    }

    fn column_value(&self, index: c_int) -> SqliteValue {
        match unsafe { ffi::sqlite3_column_type(self.raw, index) } {
            ffi::SQLITE_INTEGER => {
                SqliteValue::Integer(unsafe { ffi::sqlite3_column_int64(self.raw, index) })
            }
            ffi::SQLITE_FLOAT => {
                SqliteValue::Real(unsafe { ffi::sqlite3_column_double(self.raw, index) })
            }
            ffi::SQLITE_TEXT => {
                let data = unsafe { ffi::sqlite3_column_text(self.raw, index) };
                if data.is_null() {
                    SqliteValue::Text(String::new())
                } else {
                    let len = unsafe { ffi::sqlite3_column_bytes(self.raw, index) } as usize;
                    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
                    SqliteValue::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            }
            ffi::SQLITE_BLOB => {
                let data = unsafe { ffi::sqlite3_column_blob(self.raw, index) };
                if data.is_null() {
                    SqliteValue::Blob(Vec::new())
                } else {
                    let len = unsafe { ffi::sqlite3_column_bytes(self.raw, index) } as usize;
                    let bytes =
                        unsafe { std::slice::from_raw_parts(data as *const u8, len) };
                    SqliteValue::Blob(bytes.to_vec())
                }
            }
            _ => SqliteValue::Null,
        }
    }
}

impl Drop for SqliteStatement<'_> {
    fn drop(&mut self) {
        unsafe { ffi::sqlite3_finalize(self.raw) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_handle() -> EngineHandle {
        EngineHandle::open(":memory:").unwrap()
    }

    fn run(handle: &EngineHandle, sql: &str) {
        let mut statement = SqliteStatement::prepare(handle, sql).unwrap();
        statement.bind(Vec::new()).unwrap();
        assert!(statement.columns().unwrap().is_none());
    }

    #[test]
    fn prepare_rejects_invalid_sql() {
        let handle = memory_handle();
        let err = SqliteStatement::prepare(&handle, "SELEKT 1").unwrap_err();
        assert!(matches!(err, SqliteError::Syntax { .. }));
    }

    #[test]
    fn bind_arity_mismatch_fails_before_any_step() {
        let handle = memory_handle();
        run(&handle, "CREATE TABLE t (a INTEGER, b INTEGER)");

        let mut statement =
            SqliteStatement::prepare(&handle, "INSERT INTO t (a, b) VALUES (?1, ?2)").unwrap();
        let err = statement
            .bind(vec![SqliteValue::Integer(1)])
            .unwrap_err();
        assert!(matches!(err, SqliteError::Bind { .. }));
        drop(statement);

        let mut count = SqliteStatement::prepare(&handle, "SELECT COUNT(*) FROM t").unwrap();
        count.bind(Vec::new()).unwrap();
        let columns = count.columns().unwrap().unwrap();
        let row = count.next_row(&columns).unwrap().unwrap();
        assert_eq!(row.get("COUNT(*)"), Some(&SqliteValue::Integer(0)));
    }

    #[test]
    fn steps_through_rows_in_order() {
        let handle = memory_handle();
        run(&handle, "CREATE TABLE t (n INTEGER)");
        for n in 1..=3 {
            let mut insert =
                SqliteStatement::prepare(&handle, "INSERT INTO t (n) VALUES (?1)").unwrap();
            insert.bind(vec![SqliteValue::Integer(n)]).unwrap();
            assert!(insert.columns().unwrap().is_none());
        }

        let mut select =
            SqliteStatement::prepare(&handle, "SELECT n FROM t ORDER BY n").unwrap();
        select.bind(Vec::new()).unwrap();
        let columns = select.columns().unwrap().unwrap();
        let mut seen = Vec::new();
        while let Some(row) = select.next_row(&columns).unwrap() {
            seen.push(row.value("n", None).unwrap().clone());
        }
        assert_eq!(
            seen,
            vec![
                SqliteValue::Integer(1),
                SqliteValue::Integer(2),
                SqliteValue::Integer(3)
            ]
        );
    }

    #[test]
    fn constraint_violation_surfaces_as_step_error() {
        let handle = memory_handle();
        run(&handle, "CREATE TABLE t (n INTEGER PRIMARY KEY)");
        run(&handle, "INSERT INTO t (n) VALUES (1)");

        let mut insert = SqliteStatement::prepare(&handle, "INSERT INTO t (n) VALUES (1)").unwrap();
        insert.bind(Vec::new()).unwrap();
        let err = insert.columns().unwrap_err();
        match err {
            SqliteError::Step { message, .. } => {
                assert!(message.to_lowercase().contains("unique"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn column_identities_carry_source_tables() {
        let handle = memory_handle();
        run(&handle, "CREATE TABLE a (id INTEGER)");
        run(&handle, "CREATE TABLE b (id INTEGER)");
        run(&handle, "INSERT INTO a (id) VALUES (1)");
        run(&handle, "INSERT INTO b (id) VALUES (2)");

        let mut select =
            SqliteStatement::prepare(&handle, "SELECT a.id, b.id FROM a JOIN b").unwrap();
        select.bind(Vec::new()).unwrap();
        let columns = select.columns().unwrap().unwrap();
        assert_eq!(columns[0], SqliteColumn::with_table("a", "id"));
        assert_eq!(columns[1], SqliteColumn::with_table("b", "id"));
    }
}
