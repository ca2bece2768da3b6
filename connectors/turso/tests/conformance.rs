use cursorspec::{Connector, DatabaseLocation, Fixture, Value};
use cursorspec_turso::TursoConnector;
use proptest::prelude::*;

mod memory {
    use super::*;

    cursorspec::conformance_tests!(TursoConnector::new(DatabaseLocation::Memory));
}

mod temp_file {
    use super::*;

    cursorspec::conformance_tests!(TursoConnector::new(DatabaseLocation::TempFile));
}

#[test]
fn overrides_name_existing_checks() {
    let connector = TursoConnector::default();
    let overrides = connector.overrides();
    let ids: Vec<&str> = cursorspec::all_checks().map(|check| check.id).collect();
    assert!(overrides.unknown_checks(&ids).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn text_round_trips(text in "\\PC{0,24}") {
        let connector = TursoConnector::default();
        connector.initialize().unwrap();
        {
            let mut conn = connector.open_connection().unwrap();
            let mut stmt = conn
                .statement(&format!("SELECT {};", connector.text_literal(&text)))
                .unwrap();
            prop_assert_eq!(stmt.execute_scalar().unwrap(), Some(Value::Text(text)));
        }
        connector.uninitialize().unwrap();
    }
}
