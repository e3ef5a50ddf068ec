//! Unified error interface for weft.
//!
//! This module provides the [`ErrorCode`] trait for standardized
//! error handling across all weft crates.
//!
//! # Design
//!
//! All weft error types implement [`ErrorCode`] to provide:
//!
//! - **Machine-readable codes**: For programmatic error handling
//! - **Recoverability info**: For retry decisions made by callers
//!
//! # Example
//!
//! ```
//! use weft_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LeafError {
//!     Backend(String),
//!     BadPrompt,
//! }
//!
//! impl ErrorCode for LeafError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Backend(_) => "LEAF_BACKEND",
//!             Self::BadPrompt => "LEAF_BAD_PROMPT",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Backend(_))
//!     }
//! }
//!
//! let err = LeafError::BadPrompt;
//! assert_eq!(err.code(), "LEAF_BAD_PROMPT");
//! assert!(!err.is_recoverable());
//! ```

/// Unified error code interface for weft errors.
///
/// # Code Format
///
/// Error codes should be:
///
/// - **UPPER_SNAKE_CASE**: e.g., `"RENDER_INTERNAL"`
/// - **Namespace-prefixed**: e.g., `"RENDER_"`, `"WEFT_CONFIG_"`
/// - **Stable**: Codes do not change once defined (API contract)
///
/// # Recoverability
///
/// An error is recoverable if re-rendering the same tree may succeed
/// (a leaf producer failed transiently). Contract violations and
/// internal errors are not recoverable.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    ///
    /// - `true`: Re-rendering may succeed
    /// - `false`: Requires a code or configuration change
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows weft conventions.
///
/// # Checks
///
/// 1. Code is not empty
/// 2. Code starts with expected prefix
/// 3. Code is UPPER_SNAKE_CASE
///
/// # Panics
///
/// Panics with descriptive message if validation fails.
///
/// # Example
///
/// ```
/// use weft_types::{ErrorCode, assert_error_code};
///
/// #[derive(Debug)]
/// enum MyError { Timeout }
///
/// impl ErrorCode for MyError {
///     fn code(&self) -> &'static str { "MY_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&MyError::Timeout, "MY_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );

    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates multiple error codes at once.
///
/// Use this to verify all variants of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl ErrorCode for TestError {
        fn code(&self) -> &'static str {
            match self {
                Self::Transient => "TEST_TRANSIENT",
                Self::Permanent => "TEST_PERMANENT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[test]
    fn error_code_trait() {
        assert_eq!(TestError::Transient.code(), "TEST_TRANSIENT");
        assert!(TestError::Transient.is_recoverable());
        assert!(!TestError::Permanent.is_recoverable());
    }

    #[test]
    fn assert_error_codes_all_variants() {
        assert_error_codes(&[TestError::Transient, TestError::Permanent], "TEST_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn assert_error_code_wrong_prefix() {
        assert_error_code(&TestError::Transient, "WRONG_");
    }

    #[test]
    fn upper_snake_case_rules() {
        assert!(is_upper_snake_case("RENDER_COMPONENT_FAILED"));
        assert!(is_upper_snake_case("ERROR_123"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("render"));
        assert!(!is_upper_snake_case("_RENDER"));
        assert!(!is_upper_snake_case("RENDER_"));
        assert!(!is_upper_snake_case("RENDER__FAILED"));
    }
}
