//! The process-wide validator and free functions over it.
//!
//! The shared validator is built on first use with default options and lives
//! for the rest of the process. Rules registered through
//! [`register_validation`] are visible to every later call, from any thread.

use crate::core::{FieldLevel, Predicate, Validator, Value};
use crate::error::Result;
use std::sync::LazyLock;

static SHARED: LazyLock<Validator> = LazyLock::new(|| {
    #[cfg(feature = "tracing")]
    tracing::debug!("initializing shared validator");
    Validator::new()
});

/// The shared validator.
///
/// # Examples
///
/// ```rust
/// assert!(tagcheck::shared().has_rule("url_prefix"));
/// ```
pub fn shared() -> &'static Validator {
    &SHARED
}

/// Validate a struct with the shared validator.
///
/// See [`Validator::validate_struct`].
pub fn validate_struct(value: impl Into<Value>) -> Result<()> {
    shared().validate_struct(value)
}

/// Validate a single value against a tag with the shared validator.
///
/// See [`Validator::validate_with_tag`].
///
/// # Examples
///
/// ```rust
/// assert!(tagcheck::validate_with_tag("https://localhost:8081", "url_prefix").is_ok());
/// assert!(tagcheck::validate_with_tag("localhost:8081", "url_prefix").is_err());
/// ```
pub fn validate_with_tag(value: impl Into<Value>, tag: &str) -> Result<()> {
    shared().validate_with_tag(value, tag)
}

/// Register a rule on the shared validator.
///
/// See [`Validator::register_validation`].
pub fn register_validation<F>(tag: &str, predicate: F) -> Result<()>
where
    F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
{
    shared().register_validation(tag, predicate)
}

/// Register an optional predicate on the shared validator.
///
/// See [`Validator::register_predicate`].
pub fn register_predicate(tag: &str, predicate: Option<Predicate>) -> Result<()> {
    shared().register_predicate(tag, predicate)
}
