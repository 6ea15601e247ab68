//! Tests for `error` module

use super::error::*;
use crate::model::{ItemId, UserId};

// -------------------------------------------------------------------------
// Error code tests
// -------------------------------------------------------------------------

fn all_variants() -> Vec<Error> {
    vec![
        Error::InvalidArgument("test".into()),
        Error::UserNotFound(UserId::from("u1")),
        Error::ItemNotFound(ItemId::from("i1")),
        Error::Unsupported("test".into()),
        Error::InvalidState("test".into()),
        Error::DataModel("test".into()),
        Error::Config("test".into()),
        Error::Io(std::io::Error::other("test")),
        Error::Parse {
            line: 3,
            message: "test".into(),
        },
    ]
}

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors = all_variants();

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    for code in &codes {
        assert!(code.starts_with("AFF-"), "Code {code} should start with AFF-");
    }
}

#[test]
fn test_error_display_includes_code() {
    // Arrange
    let err = Error::UserNotFound(UserId::from("alice"));

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.contains("[AFF-002]"));
    assert!(display.contains("alice"));
}

#[test]
fn test_parse_error_display_includes_line() {
    let err = Error::Parse {
        line: 12,
        message: "expected 3 fields".into(),
    };
    assert_eq!(
        err.to_string(),
        "[AFF-009] Parse error at line 12: expected 3 fields"
    );
}

#[test]
fn test_not_found_classification() {
    assert!(Error::UserNotFound(UserId::from("a")).is_not_found());
    assert!(Error::ItemNotFound(ItemId::from("b")).is_not_found());
    assert!(!Error::InvalidArgument("x".into()).is_not_found());
    assert!(!Error::DataModel("x".into()).is_not_found());
}

#[test]
fn test_recoverable_classification() {
    assert!(Error::InvalidArgument("x".into()).is_recoverable());
    assert!(Error::Unsupported("x".into()).is_recoverable());
    assert!(!Error::InvalidState("x".into()).is_recoverable());
}

#[test]
fn test_io_error_converts() {
    fn fails() -> Result<()> {
        Err(std::io::Error::other("disk"))?;
        Ok(())
    }

    let err = fails().unwrap_err();
    assert_eq!(err.code(), "AFF-008");
}
