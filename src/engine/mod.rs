//! Native SQLite engine boundary.
//!
//! Everything that touches the raw C API lives here:
//! - `EngineHandle`: one open `sqlite3*`, handle-scoped error message and
//!   last-inserted rowid accessors
//! - `SqliteStatement`: one prepared `sqlite3_stmt*` driven through
//!   prepare, bind, step, and column extraction
//!
//! All calls are synchronous and must stay on the connection's dedicated
//! worker thread; nothing in this module suspends.

mod statement;

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use libsqlite3_sys as ffi;

pub(crate) use statement::SqliteStatement;

use crate::error::SqliteError;

/// Owner of one open engine handle.
///
/// The handle is closed when the owner drops. The driver confines every use
/// after opening to a single worker thread.
#[derive(Debug)]
pub(crate) struct EngineHandle {
    raw: *mut ffi::sqlite3,
}

// One thread at a time uses the handle; the worker owns it for its whole
// lifetime, and the database anchor handle is only opened and dropped.
unsafe impl Send for EngineHandle {}
unsafe impl Sync for EngineHandle {}

impl EngineHandle {
    /// Open a database file, plain path or `file:` URI.
    pub(crate) fn open(target: &str) -> Result<Self, SqliteError> {
        let path = CString::new(target).map_err(|_| SqliteError::Open {
            code: ffi::SQLITE_MISUSE,
            message: "database path contains an interior nul byte".to_string(),
        })?;
        let mut raw = ptr::null_mut();
        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_URI;
        let rc = unsafe { ffi::sqlite3_open_v2(path.as_ptr(), &mut raw, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            // sqlite allocates a handle even on failure, and it must be closed
            let message = if raw.is_null() {
                "out of memory".to_string()
            } else {
                let message = read_cstr(unsafe { ffi::sqlite3_errmsg(raw) })
                    .unwrap_or_else(|| "unknown engine error".to_string());
                unsafe { ffi::sqlite3_close(raw) };
                message
            };
            return Err(SqliteError::Open { code: rc, message });
        }
        Ok(Self { raw })
    }

    pub(crate) fn raw(&self) -> *mut ffi::sqlite3 {
        self.raw
    }

    /// Last error message recorded on this handle.
    pub(crate) fn error_message(&self) -> String {
        read_cstr(unsafe { ffi::sqlite3_errmsg(self.raw) })
            .unwrap_or_else(|| "unknown engine error".to_string())
    }

    /// Extended result code of the most recent failed call on this handle.
    pub(crate) fn error_code(&self) -> i32 {
        unsafe { ffi::sqlite3_extended_errcode(self.raw) }
    }

    /// Rowid of the most recent successful INSERT on this handle, 0 if none.
    pub(crate) fn last_insert_rowid(&self) -> i64 {
        unsafe { ffi::sqlite3_last_insert_rowid(self.raw) }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        unsafe { ffi::sqlite3_close(self.raw) };
    }
}

/// Copy an engine-owned C string, None for a null pointer.
pub(crate) fn read_cstr(raw: *const c_char) -> Option<String> {
    if raw.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
}
