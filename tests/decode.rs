//! Record decoding and duplicate-column disambiguation across joins.

use chrono::{DateTime, Utc};
use pondlite::{SqliteColumn, SqliteConnection, SqliteDatabase, SqliteError, SqliteQuery, Storage};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Named {
    id: i64,
    name: String,
}

async fn connect_with_join_data() -> SqliteConnection {
    let database = SqliteDatabase::open(Storage::memory()).unwrap();
    let conn = database.connect().unwrap();
    conn.query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", |_| Ok(()))
        .await
        .unwrap();
    conn.query("CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT, owner_id INTEGER)", |_| {
        Ok(())
    })
    .await
    .unwrap();
    conn.query("INSERT INTO users (id, name) VALUES (1, 'mira')", |_| Ok(()))
        .await
        .unwrap();
    conn.query(
        "INSERT INTO pets (id, name, owner_id) VALUES (10, 'teal', 1)",
        |_| Ok(()),
    )
    .await
    .unwrap();
    conn
}

const JOIN_SQL: &str = "SELECT users.id, users.name, pets.id, pets.name \
     FROM users JOIN pets ON pets.owner_id = users.id";

#[tokio::test]
async fn join_columns_keep_their_source_tables() {
    let conn = connect_with_join_data().await;
    let rows = conn.query_all(JOIN_SQL).await.unwrap();
    let columns: Vec<SqliteColumn> = rows[0].columns().cloned().collect();
    assert_eq!(
        columns,
        vec![
            SqliteColumn::with_table("users", "id"),
            SqliteColumn::with_table("users", "name"),
            SqliteColumn::with_table("pets", "id"),
            SqliteColumn::with_table("pets", "name"),
        ]
    );
}

#[tokio::test]
async fn decode_by_table_splits_a_joined_row() {
    let conn = connect_with_join_data().await;
    let rows = conn.query_all(JOIN_SQL).await.unwrap();

    let user: Named = conn.decode(&rows[0], Some("users")).unwrap();
    let pet: Named = conn.decode(&rows[0], Some("pets")).unwrap();
    assert_eq!(
        user,
        Named {
            id: 1,
            name: "mira".to_string()
        }
    );
    assert_eq!(
        pet,
        Named {
            id: 10,
            name: "teal".to_string()
        }
    );
}

#[tokio::test]
async fn decode_without_table_takes_first_occurrences() {
    let conn = connect_with_join_data().await;
    let rows = conn.query_all(JOIN_SQL).await.unwrap();
    let first: Named = conn.decode(&rows[0], None).unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(first.name, "mira");
}

#[tokio::test]
async fn decode_with_unknown_table_is_an_error() {
    let conn = connect_with_join_data().await;
    let rows = conn.query_all(JOIN_SQL).await.unwrap();
    let err = conn.decode::<Named>(&rows[0], Some("orders")).unwrap_err();
    assert!(matches!(err, SqliteError::InvalidTable(_)));
}

#[tokio::test]
async fn unqualified_duplicates_resolve_by_occurrence() {
    let conn = connect_with_join_data().await;
    // expression columns carry no table qualifier
    let rows = conn
        .query_all(
            "SELECT users.id + 0 AS id, pets.id + 0 AS id \
             FROM users JOIN pets ON pets.owner_id = users.id",
        )
        .await
        .unwrap();
    let row = &rows[0];

    let columns: Vec<SqliteColumn> = row.columns().cloned().collect();
    assert_eq!(columns[0].occurrence, 1);
    assert_eq!(columns[1].occurrence, 2);
    assert!(columns[0].same_source(&columns[1]));

    assert_eq!(row.value_at("id", None, 1).unwrap().decode::<i64>().unwrap(), 1);
    assert_eq!(row.value_at("id", None, 2).unwrap().decode::<i64>().unwrap(), 10);

    #[derive(Debug, Deserialize)]
    struct Pick {
        id: i64,
    }
    let second: Pick = conn.decode_occurrence(row, None, 2).unwrap();
    assert_eq!(second.id, 10);
}

#[tokio::test]
async fn optional_fields_absorb_nulls_and_missing_columns() {
    let database = SqliteDatabase::open(Storage::memory()).unwrap();
    let conn = database.connect().unwrap();
    conn.query("CREATE TABLE notes (id INTEGER, body TEXT)", |_| Ok(()))
        .await
        .unwrap();
    conn.query("INSERT INTO notes (id, body) VALUES (1, NULL)", |_| Ok(()))
        .await
        .unwrap();

    #[derive(Debug, Deserialize)]
    struct Note {
        id: i64,
        body: Option<String>,
        label: Option<String>,
    }
    let rows = conn.query_all("SELECT id, body FROM notes").await.unwrap();
    let note: Note = conn.decode(&rows[0], None).unwrap();
    assert_eq!(note.id, 1);
    assert_eq!(note.body, None);
    assert_eq!(note.label, None);
}

#[tokio::test]
async fn missing_required_columns_report_column_not_found() {
    let conn = connect_with_join_data().await;
    let rows = conn.query_all("SELECT id FROM users").await.unwrap();

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Wide {
        id: i64,
        name: String,
        age: i64,
    }
    let err = conn.decode::<Wide>(&rows[0], None).unwrap_err();
    assert!(matches!(err, SqliteError::ColumnNotFound { .. }));
}

#[tokio::test]
async fn datetimes_round_trip_as_text() {
    let database = SqliteDatabase::open(Storage::memory()).unwrap();
    let conn = database.connect().unwrap();
    conn.query("CREATE TABLE events (at TEXT)", |_| Ok(()))
        .await
        .unwrap();

    let stamp: DateTime<Utc> = "2024-05-01T12:30:00Z".parse().unwrap();
    let insert = SqliteQuery::new("INSERT INTO events (at) VALUES (?1)").bind(stamp);
    conn.query(insert, |_| Ok(())).await.unwrap();

    let rows = conn.query_all("SELECT at FROM events").await.unwrap();
    let back: DateTime<Utc> = rows[0].value("at", None).unwrap().decode().unwrap();
    assert_eq!(back, stamp);
}
