use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::SqliteError;
use crate::row::SqliteColumn;
use crate::value::{from_row, SqliteValue};

/// One materialized result row.
///
/// Keys preserve result-set position order, which is what makes the default
/// lookup rule (occurrence 1, first position wins) deterministic. Keys are
/// unique within a row: the resolver's occurrence increments guarantee it
/// even when two source columns share table and name.
#[derive(Debug, Clone, Default)]
pub struct SqliteRow {
    entries: IndexMap<SqliteColumn, SqliteValue>,
}

impl SqliteRow {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, column: SqliteColumn, value: SqliteValue) {
        self.entries.insert(column, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns in result-set position order.
    pub fn columns(&self) -> impl Iterator<Item = &SqliteColumn> {
        self.entries.keys()
    }

    /// (column, value) pairs in result-set position order.
    pub fn iter(&self) -> impl Iterator<Item = (&SqliteColumn, &SqliteValue)> {
        self.entries.iter()
    }

    /// Value for an exact column identity.
    pub fn column_value(&self, column: &SqliteColumn) -> Option<&SqliteValue> {
        self.entries.get(column)
    }

    /// First value whose column matches the name, searching any table.
    pub fn get(&self, name: &str) -> Option<&SqliteValue> {
        self.first_value(name, None)
    }

    /// First value matching name and table under the wildcard rule: an
    /// unqualified column matches any requested table, and a lookup without
    /// a table matches any column.
    pub fn first_value(&self, name: &str, table: Option<&str>) -> Option<&SqliteValue> {
        self.entries.iter().find_map(|(column, value)| {
            let table_matches = match (column.table.as_deref(), table) {
                (Some(have), Some(want)) => have == want,
                _ => true,
            };
            (table_matches && column.name == name).then_some(value)
        })
    }

    /// Value at a logical position, defaulting to the first occurrence.
    ///
    /// Equivalent to [`SqliteRow::value_at`] with occurrence 1.
    pub fn value(&self, name: &str, table: Option<&str>) -> Result<&SqliteValue, SqliteError> {
        self.value_at(name, table, 1)
    }

    /// Value at an explicit (name, table, occurrence) position.
    ///
    /// Table matching follows the wildcard rule; occurrence is exact. Errors
    /// with `ColumnNotFound` when no column matches.
    pub fn value_at(
        &self,
        name: &str,
        table: Option<&str>,
        occurrence: u32,
    ) -> Result<&SqliteValue, SqliteError> {
        self.entries
            .iter()
            .find_map(|(column, value)| {
                let table_matches = match (column.table.as_deref(), table) {
                    (Some(have), Some(want)) => have == want,
                    _ => true,
                };
                (table_matches && column.name == name && column.occurrence == occurrence)
                    .then_some(value)
            })
            .ok_or_else(|| SqliteError::ColumnNotFound {
                column: match table {
                    Some(table) => format!("{table}.{occurrence}.{name}"),
                    None => format!("{occurrence}.{name}"),
                },
            })
    }

    /// Decode this row into a structured record, optionally restricted to
    /// one source table's columns.
    pub fn decode<'de, T: Deserialize<'de>>(
        &'de self,
        table: Option<&str>,
    ) -> Result<T, SqliteError> {
        from_row(self, table, None)
    }

    /// Decode restricted to one occurrence, for materializing per-table
    /// records out of a joined result set.
    pub fn decode_at<'de, T: Deserialize<'de>>(
        &'de self,
        table: Option<&str>,
        occurrence: u32,
    ) -> Result<T, SqliteError> {
        from_row(self, table, Some(occurrence))
    }
}

impl FromIterator<(SqliteColumn, SqliteValue)> for SqliteRow {
    fn from_iter<I: IntoIterator<Item = (SqliteColumn, SqliteValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::resolve_columns;

    fn join_row() -> SqliteRow {
        let columns = resolve_columns(vec![
            (Some("a".to_string()), "id".to_string()),
            (Some("b".to_string()), "id".to_string()),
        ]);
        columns
            .into_iter()
            .zip([SqliteValue::Integer(1), SqliteValue::Integer(2)])
            .collect()
    }

    fn unqualified_row() -> SqliteRow {
        let columns = resolve_columns(vec![
            (None, "id".to_string()),
            (None, "id".to_string()),
        ]);
        columns
            .into_iter()
            .zip([SqliteValue::Integer(10), SqliteValue::Integer(20)])
            .collect()
    }

    #[test]
    fn default_lookup_returns_first_positional_occurrence() {
        let row = join_row();
        assert_eq!(row.value("id", None).unwrap(), &SqliteValue::Integer(1));
        assert_eq!(
            row.value("id", Some("b")).unwrap(),
            &SqliteValue::Integer(2)
        );
    }

    #[test]
    fn occurrence_lookup_distinguishes_duplicate_names() {
        let row = unqualified_row();
        assert_eq!(
            row.value_at("id", None, 1).unwrap(),
            &SqliteValue::Integer(10)
        );
        assert_eq!(
            row.value_at("id", None, 2).unwrap(),
            &SqliteValue::Integer(20)
        );
        assert!(matches!(
            row.value_at("id", None, 3),
            Err(SqliteError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn missing_column_reports_its_logical_position() {
        let row = join_row();
        let err = row.value("name", Some("a")).unwrap_err();
        match err {
            SqliteError::ColumnNotFound { column } => assert_eq!(column, "a.1.name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unqualified_columns_match_any_requested_table() {
        let columns = resolve_columns(vec![(None, "total".to_string())]);
        let row: SqliteRow = columns
            .into_iter()
            .zip([SqliteValue::Integer(99)])
            .collect();
        assert_eq!(
            row.first_value("total", Some("orders")),
            Some(&SqliteValue::Integer(99))
        );
    }
}
