use cursorspec::{Connector, DatabaseLocation, Fixture, Value};
use cursorspec_sqlite::SqliteConnector;
use proptest::prelude::*;

mod memory {
    use super::*;

    cursorspec::conformance_tests!(SqliteConnector::new(DatabaseLocation::Memory));
}

mod temp_file {
    use super::*;

    cursorspec::conformance_tests!(SqliteConnector::new(DatabaseLocation::TempFile));
}

/// Read back the single row of `sql` through the untyped accessor.
fn select_row(connector: &SqliteConnector, sql: &str, width: usize) -> Vec<Value> {
    let mut conn = connector.open_connection().unwrap();
    let mut stmt = conn.statement(sql).unwrap();
    let mut cursor = stmt.execute_cursor().unwrap();
    assert!(cursor.read().unwrap());
    let mut dest = vec![Value::Null; width];
    let copied = cursor.get_values(&mut dest).unwrap();
    dest.truncate(copied);
    dest
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn text_round_trips(text in "\\PC{0,24}") {
        let connector = SqliteConnector::default();
        connector.initialize().unwrap();
        let sql = format!("SELECT {};", connector.text_literal(&text));
        let row = select_row(&connector, &sql, 1);
        prop_assert_eq!(row, vec![Value::Text(text)]);
        connector.uninitialize().unwrap();
    }

    #[test]
    fn get_values_copies_the_shorter_width(columns in 1usize..6, width in 0usize..8) {
        let connector = SqliteConnector::default();
        connector.initialize().unwrap();
        let select = (0..columns).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
        let row = select_row(&connector, &format!("SELECT {select};"), width);
        prop_assert_eq!(row.len(), columns.min(width));
        for (i, value) in row.iter().enumerate() {
            prop_assert_eq!(value, &Value::Integer(i as i64));
        }
        connector.uninitialize().unwrap();
    }
}
