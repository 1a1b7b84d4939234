use std::fmt;

/// Identity of one column position in a result set.
///
/// A join can surface the same column name from several source tables, and
/// the same (table, name) pair can appear more than once in one result set.
/// `occurrence` is the 1-based rank of this column among all columns sharing
/// its exact (table, name) pair, counted left to right, so every position
/// keeps a distinct, addressable identity.
///
/// Identity includes all three fields. The occurrence-ignoring relation is
/// [`SqliteColumn::same_source`]; lookups that leave the occurrence
/// unspecified mean occurrence 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqliteColumn {
    /// Source table, absent for expression columns.
    pub table: Option<String>,
    /// Column name as reported by the statement.
    pub name: String,
    /// 1-based rank among columns with the same (table, name) pair.
    pub occurrence: u32,
}

impl SqliteColumn {
    /// An unqualified column with occurrence 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
            occurrence: 1,
        }
    }

    /// A table-qualified column with occurrence 1.
    pub fn with_table(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
            occurrence: 1,
        }
    }

    /// Whether two columns name the same (table, name) pair, regardless of
    /// occurrence.
    pub fn same_source(&self, other: &SqliteColumn) -> bool {
        self.table == other.table && self.name == other.name
    }
}

impl fmt::Display for SqliteColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}.{}", self.occurrence, self.name),
            None => write!(f, "{}.{}", self.occurrence, self.name),
        }
    }
}

/// Assign identities to an ordered list of raw column descriptors.
///
/// Repeated (table, name) pairs receive strictly increasing occurrences
/// starting at 1, in positional order. Columns without a table qualifier
/// count occurrences among themselves by name alone; they never collide with
/// qualified columns. Deterministic, no reordering.
pub fn resolve_columns(raw: Vec<(Option<String>, String)>) -> Vec<SqliteColumn> {
    let mut columns: Vec<SqliteColumn> = Vec::with_capacity(raw.len());
    for (table, name) in raw {
        let occurrence = columns
            .iter()
            .filter(|column| column.table == table && column.name == name)
            .count() as u32
            + 1;
        columns.push(SqliteColumn {
            table,
            name,
            occurrence,
        });
    }
    columns
}
