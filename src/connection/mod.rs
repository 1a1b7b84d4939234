//! Connections and the asynchronous query entry point.

mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::database::SqliteDatabase;
use crate::engine::EngineHandle;
use crate::error::SqliteError;
use crate::query::SqliteQuery;
use crate::row::SqliteRow;
use worker::Command;

/// A connection to a SQLite database, created by [`SqliteDatabase::connect`].
///
/// The connection owns exactly one engine handle, which lives on the
/// connection's dedicated worker thread and is only ever touched there.
/// Queries submitted on one connection execute strictly in submission
/// order. The reference back to the originating database keeps the
/// underlying engine resource alive for as long as the connection exists.
///
/// ```no_run
/// # async fn demo() -> Result<(), pondlite::SqliteError> {
/// use pondlite::{SqliteDatabase, Storage};
///
/// let database = SqliteDatabase::open(Storage::memory())?;
/// let conn = database.connect()?;
/// conn.query("SELECT sqlite_version()", |row| {
///     println!("{:?}", row.get("sqlite_version()"));
///     Ok(())
/// })
/// .await?;
/// # Ok(()) }
/// ```
pub struct SqliteConnection {
    database: Arc<SqliteDatabase>,
    commands: mpsc::UnboundedSender<Command>,
    closed: AtomicBool,
}

impl SqliteConnection {
    pub(crate) fn new(
        database: Arc<SqliteDatabase>,
        handle: EngineHandle,
    ) -> Result<Self, SqliteError> {
        let commands = worker::spawn(handle)?;
        Ok(Self {
            database,
            commands,
            closed: AtomicBool::new(false),
        })
    }

    /// The database this connection belongs to.
    pub fn database(&self) -> &Arc<SqliteDatabase> {
        &self.database
    }

    /// Execute a query, calling `on_row` for each row produced.
    ///
    /// The prepare/bind/step loop runs on the connection's worker thread;
    /// this future never blocks the caller's scheduler. Rows are delivered
    /// in production order, at most one in flight, each strictly before the
    /// future resolves. A failing callback aborts the remaining stepping
    /// and becomes the query's failure; the future resolves exactly once
    /// either way, and no callback runs after it resolves.
    pub async fn query<Q, F>(&self, query: Q, mut on_row: F) -> Result<(), SqliteError>
    where
        Q: Into<SqliteQuery>,
        F: FnMut(SqliteRow) -> Result<(), SqliteError>,
    {
        self.ensure_open()?;
        let (sql, binds) = query.into().into_parts();
        debug!(sql = %sql, binds = binds.len(), "executing statement");

        let (row_sender, mut row_receiver) = mpsc::channel(1);
        let (done_sender, done_receiver) = oneshot::channel();
        self.commands
            .send(Command::Query {
                sql,
                binds,
                rows: row_sender,
                done: done_sender,
            })
            .map_err(|_| SqliteError::ConnectionClosed)?;

        while let Some(row) = row_receiver.recv().await {
            // a callback failure drops the receiver, stopping the worker
            on_row(row)?;
        }
        done_receiver
            .await
            .unwrap_or(Err(SqliteError::ConnectionClosed))
    }

    /// Execute a query and collect every row.
    pub async fn query_all<Q>(&self, query: Q) -> Result<Vec<SqliteRow>, SqliteError>
    where
        Q: Into<SqliteQuery>,
    {
        let mut rows = Vec::new();
        self.query(query, |row| {
            rows.push(row);
            Ok(())
        })
        .await?;
        Ok(rows)
    }

    /// Rowid of the most recent successful INSERT on this connection.
    ///
    /// Ordered with respect to queries: the value reflects every statement
    /// submitted before this call.
    pub async fn last_insert_rowid(&self) -> Result<Option<i64>, SqliteError> {
        self.ensure_open()?;
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::LastInsertRowid { reply })
            .map_err(|_| SqliteError::ConnectionClosed)?;
        let rowid = receiver.await.map_err(|_| SqliteError::ConnectionClosed)?;
        Ok((rowid != 0).then_some(rowid))
    }

    /// Decode a row into a structured record, optionally restricted to one
    /// source table's columns.
    pub fn decode<'de, T: Deserialize<'de>>(
        &self,
        row: &'de SqliteRow,
        table: Option<&str>,
    ) -> Result<T, SqliteError> {
        row.decode(table)
    }

    /// Decode restricted to an explicit occurrence, picking one source
    /// table's values out of a joined result set with duplicate column
    /// names.
    pub fn decode_occurrence<'de, T: Deserialize<'de>>(
        &self,
        row: &'de SqliteRow,
        table: Option<&str>,
        occurrence: u32,
    ) -> Result<T, SqliteError> {
        row.decode_at(table, occurrence)
    }

    /// Close the connection. Idempotent; only flips state. The engine
    /// handle is released when the connection is dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), SqliteError> {
        if self.is_closed() {
            return Err(SqliteError::ConnectionClosed);
        }
        Ok(())
    }
}
