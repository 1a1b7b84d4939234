//! Result-set rows and the column identities that address them.

mod column;
mod row;

pub use column::{resolve_columns, SqliteColumn};
pub use row::SqliteRow;
