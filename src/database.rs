//! Database handles and connection creation.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::connection::SqliteConnection;
use crate::engine::EngineHandle;
use crate::error::SqliteError;

/// Where a database lives.
#[derive(Debug, Clone)]
pub enum Storage {
    /// An in-memory database, shared by every connection of one
    /// [`SqliteDatabase`] and discarded when the database is dropped.
    Memory { id: Uuid },
    /// A database file on disk, created on first open.
    File { path: PathBuf },
}

impl Storage {
    pub fn memory() -> Self {
        Storage::Memory { id: Uuid::new_v4() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Storage::File { path: path.into() }
    }

    /// The engine-facing open target.
    ///
    /// In-memory databases use a uniquely named shared-cache URI so that
    /// separate connections observe the same data.
    fn target(&self) -> String {
        match self {
            Storage::Memory { id } => {
                format!("file:pondlite-{}?mode=memory&cache=shared", id.simple())
            }
            Storage::File { path } => path.display().to_string(),
        }
    }
}

/// An open SQLite database, the factory for its connections.
///
/// Opening validates the storage eagerly by acquiring an anchor engine
/// handle. For in-memory databases the anchor also pins the shared database
/// for the lifetime of this value; connections hold an `Arc` back to it, so
/// the native resource outlives every connection.
pub struct SqliteDatabase {
    storage: Storage,
    _anchor: EngineHandle,
}

impl SqliteDatabase {
    /// Open a database with the given storage.
    pub fn open(storage: Storage) -> Result<Arc<Self>, SqliteError> {
        let anchor = EngineHandle::open(&storage.target())?;
        info!(storage = ?storage, "opened sqlite database");
        Ok(Arc::new(Self {
            storage,
            _anchor: anchor,
        }))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Open a new connection with its own engine handle and dedicated
    /// worker thread.
    pub fn connect(self: &Arc<Self>) -> Result<SqliteConnection, SqliteError> {
        let handle = EngineHandle::open(&self.storage.target())?;
        debug!(storage = ?self.storage, "opened connection");
        SqliteConnection::new(self.clone(), handle)
    }
}
