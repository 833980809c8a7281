//! Opening and probing against bus devices that do not exist.

use sm16inpind::{discover, Board, Error, RetryPolicy};

const MISSING_BUS: &str = "/nonexistent/i2c-99";

#[test]
fn test_open_missing_bus_reports_path_and_address() {
    let err = Board::open_on(MISSING_BUS, 7, RetryPolicy::once()).unwrap_err();
    match &err {
        Error::BusOpen { path, address, .. } => {
            assert_eq!(path, MISSING_BUS);
            assert_eq!(*address, 0x20);
        }
        other => panic!("Expected BusOpen, got {:?}", other),
    }
    assert!(!err.is_range_error());
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_discover_on_missing_bus_finds_nothing() {
    assert!(discover(MISSING_BUS).is_empty());
}
