//! Assertion sink. A false condition becomes [`Failure::Validation`] so the
//! host test runner can mark the step failed and keep going.

use crate::failure::{Failure, Result};

pub fn assert_true(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(fail(message()))
    }
}

pub fn fail(message: impl Into<String>) -> Failure {
    Failure::validation(message)
}

/// Prefix a caller-supplied message the way every verifier does: `msg -- `.
pub(crate) fn with_prefix(message: Option<&str>, body: &str) -> String {
    match message {
        Some(prefix) if !prefix.is_empty() => format!("{prefix} -- {body}"),
        _ => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn false_condition_raises_validation() {
        assert!(assert_true(true, || "unused".to_owned()).is_ok());
        let failure = assert_true(false, || "boom".to_owned()).expect_err("should fail");
        assert_eq!(failure.to_string(), "boom");
    }

    #[test]
    fn prefix_is_optional() {
        assert_eq!(with_prefix(Some("orders"), "No entry"), "orders -- No entry");
        assert_eq!(with_prefix(None, "No entry"), "No entry");
    }
}
