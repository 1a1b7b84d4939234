//! Dedicated execution worker, one per connection.
//!
//! The worker thread owns the engine handle outright and drains a FIFO
//! command channel, so statements on one connection never interleave at the
//! engine level. Rows flow back through a capacity-1 channel: the worker
//! blocks until the caller has taken the previous row, keeping at most one
//! row in flight, and a dropped receiver aborts the remaining stepping.

use std::thread;

use libsqlite3_sys as ffi;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine::{EngineHandle, SqliteStatement};
use crate::error::SqliteError;
use crate::row::SqliteRow;
use crate::value::SqliteValue;

pub(crate) enum Command {
    Query {
        sql: String,
        binds: Vec<SqliteValue>,
        rows: mpsc::Sender<SqliteRow>,
        done: oneshot::Sender<Result<(), SqliteError>>,
    },
    LastInsertRowid {
        reply: oneshot::Sender<i64>,
    },
}

/// Move the engine handle onto a fresh worker thread and return its
/// submission queue. The worker exits, closing the handle, once every
/// sender is gone.
pub(crate) fn spawn(handle: EngineHandle) -> Result<mpsc::UnboundedSender<Command>, SqliteError> {
    let (commands, receiver) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("pondlite-worker".to_string())
        .spawn(move || run(handle, receiver))
        .map_err(|err| SqliteError::Open {
            code: ffi::SQLITE_ERROR,
            message: format!("failed to spawn connection worker: {err}"),
        })?;
    Ok(commands)
}

fn run(handle: EngineHandle, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.blocking_recv() {
        match command {
            Command::Query {
                sql,
                binds,
                rows,
                done,
            } => {
                let result = execute(&handle, &sql, binds, &rows);
                // the caller may have stopped listening, which is fine
                let _ = done.send(result);
            }
            Command::LastInsertRowid { reply } => {
                let _ = reply.send(handle.last_insert_rowid());
            }
        }
    }
    debug!("connection worker shutting down");
}

fn execute(
    handle: &EngineHandle,
    sql: &str,
    binds: Vec<SqliteValue>,
    rows: &mpsc::Sender<SqliteRow>,
) -> Result<(), SqliteError> {
    let mut statement = SqliteStatement::prepare(handle, sql)?;
    statement.bind(binds)?;
    if let Some(columns) = statement.columns()? {
        while let Some(row) = statement.next_row(&columns)? {
            if rows.blocking_send(row).is_err() {
                debug!("row receiver dropped, abandoning statement");
                break;
            }
        }
    }
    Ok(())
}
