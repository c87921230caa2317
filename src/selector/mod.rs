//! Kubernetes label and field selector parsing.
//!
//! Backs the `k8s_label_selector` and `k8s_field_selector` rules, and is
//! usable on its own.
//!
//! # Examples
//!
//! ```rust
//! use tagcheck::selector::{is_indexable_field, parse_field_selector, parse_label_selector};
//!
//! assert!(parse_label_selector("env=prod,!canary").is_ok());
//!
//! let selector = parse_field_selector("spec.nodeName=node-1").unwrap();
//! assert!(selector.requirements().iter().all(|r| is_indexable_field(r.key())));
//! ```

mod field;
mod label;
mod names;

pub use field::{
    FieldOperator, FieldRequirement, FieldSelector, escape_field_value, parse_field_selector,
    unescape_field_value,
};
pub use label::{LabelOperator, LabelRequirement, LabelSelector, parse_label_selector};
pub use names::NameError;

use thiserror::Error;

/// Field keys a field selector may name.
pub const INDEXABLE_FIELD_KEYS: &[&str] = &[
    "metadata.name",
    "metadata.namespace",
    "status.phase",
    "spec.nodeName",
    "spec.unschedulable",
    "status.hostIP",
    "status.podIP",
];

/// Whether `key` is one of [`INDEXABLE_FIELD_KEYS`]. Matching is exact.
pub fn is_indexable_field(key: &str) -> bool {
    INDEXABLE_FIELD_KEYS.contains(&key)
}

/// Errors from parsing selectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The parser met a token it did not expect.
    #[error("found '{found}', expected: {expected}")]
    Unexpected {
        /// Literal text of the token found
        found: String,
        /// What would have been accepted
        expected: &'static str,
    },

    /// A label key is not a valid qualified name.
    #[error("invalid label key \"{key}\": {reason}")]
    InvalidKey {
        /// The key
        key: String,
        /// Why it was rejected
        reason: NameError,
    },

    /// A label value is not valid.
    #[error("invalid label value \"{value}\": {reason}")]
    InvalidValue {
        /// The value
        value: String,
        /// Why it was rejected
        reason: NameError,
    },

    /// `in` or `notin` with no values.
    #[error("for 'in', 'notin' operators, values set can't be empty: {key}")]
    EmptyValues {
        /// The label key
        key: String,
    },

    /// An exact-match or comparison operator without exactly one value.
    #[error("exact-match compatibility requires one single value: {key}")]
    SingleValue {
        /// The label key
        key: String,
    },

    /// An existence operator given values.
    #[error("values set must be empty for exists and does not exist: {key}")]
    UnexpectedValues {
        /// The label key
        key: String,
    },

    /// `>` or `<` with a value that is not an integer.
    #[error("for 'Gt', 'Lt' operators, the value must be an integer: {value}")]
    NonIntegerValue {
        /// The value
        value: String,
    },

    /// A field selector term with no operator.
    #[error("invalid selector: '{selector}'; can't understand '{term}'")]
    MissingOperator {
        /// The whole selector
        selector: String,
        /// The offending term
        term: String,
    },

    /// A backslash escape other than `\\`, `\,` or `\=`.
    #[error("invalid field selector: invalid escape sequence: {sequence}")]
    InvalidEscape {
        /// The escape sequence
        sequence: String,
    },

    /// A `,` or `=` in a field value without a backslash.
    #[error("invalid field selector: unescaped character: {character}")]
    UnescapedCharacter {
        /// The character
        character: char,
    },
}
