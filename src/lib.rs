//! Asynchronous driver for embedded SQLite databases.
//!
//! SQLite's C API is synchronous and its handles are not safely reentrant.
//! This crate bridges that API to an async caller: every connection gets a
//! dedicated worker thread that owns the engine handle and executes
//! statements strictly in submission order, while rows stream back to the
//! caller's task one at a time, in production order.
//!
//! ```no_run
//! use pondlite::{SqliteDatabase, Storage};
//!
//! # async fn demo() -> Result<(), pondlite::SqliteError> {
//! let database = SqliteDatabase::open(Storage::file("app.sqlite"))?;
//! let conn = database.connect()?;
//!
//! conn.query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", |_| Ok(()))
//!     .await?;
//!
//! let insert = pondlite::SqliteQuery::new("INSERT INTO users (name) VALUES (?1)").bind("swan");
//! conn.query(insert, |_| Ok(())).await?;
//!
//! conn.query("SELECT id, name FROM users", |row| {
//!     println!("{:?} -> {:?}", row.value("id", None)?, row.value("name", None)?);
//!     Ok(())
//! })
//! .await?;
//! # Ok(()) }
//! ```
//!
//! Result columns keep their source-table identity, and duplicate names
//! arising from joins are disambiguated with 1-based occurrence numbers, so
//! every column of `SELECT a.id, b.id FROM a JOIN b` stays individually
//! addressable.

pub mod connection;
pub mod database;
mod engine;
pub mod error;
pub mod query;
pub mod row;
pub mod value;

pub use connection::SqliteConnection;
pub use database::{SqliteDatabase, Storage};
pub use error::SqliteError;
pub use query::SqliteQuery;
pub use row::{resolve_columns, SqliteColumn, SqliteRow};
pub use value::SqliteValue;
