//! Error types for tagcheck.

use crate::core::{EngineError, Value};
use serde::Serialize;
use std::fmt;

/// Result type alias for tagcheck operations.
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Errors returned by the validation facade.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// Struct validation was handed an untyped nil.
    #[error("input is nil")]
    NilInput,

    /// Struct validation was handed a typed pointer with no referent.
    #[error("input is a nil pointer")]
    NilPointer,

    /// One or more fields violated their rules.
    #[error("validation failed: {0}")]
    ValidationFailed(FieldErrors),

    /// The rule engine failed for a reason other than a rule violation.
    #[error("unexpected validation error: {0}")]
    Unexpected(#[source] EngineError),

    /// A predicate could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl ValidatorError {
    /// The per-field failures, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<EngineError> for ValidatorError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(errors) => Self::ValidationFailed(errors),
            other => Self::Unexpected(other),
        }
    }
}

/// Errors raised while registering a predicate with the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The tag name was empty.
    #[error("function Key cannot be empty")]
    EmptyKey,

    /// No predicate was supplied.
    #[error("function cannot be empty")]
    EmptyFunction,

    /// The tag name is reserved by the tag grammar.
    #[error(
        "tag '{0}' either contains restricted characters or is the same as a restricted tag needed for normal operation"
    )]
    Restricted(String),
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `Config.server.port`. `None` for bare values.
    pub namespace: Option<String>,
    /// Name of the field as declared on its struct.
    pub field: Option<String>,
    /// The tag element that failed, as written (`gt`, `rgb|rgba`).
    pub tag: String,
    /// Parameter of the failing tag, empty when it has none.
    pub param: String,
    /// Kind of the offending value (`string`, `int`, ...).
    pub kind: &'static str,
    /// The offending value.
    pub value: Value,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            return write!(f, "{} ({}={})", namespace, self.tag, self.param);
        }
        if self.value.is_nil() {
            return write!(f, "nil value ({}={})", self.tag, self.param);
        }
        write!(
            f,
            "{} {} ({}={})",
            self.kind, self.value, self.tag, self.param
        )
    }
}

/// All rule violations found in one validation pass, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no violations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_error(namespace: Option<&str>, tag: &str, param: &str, value: Value) -> FieldError {
        FieldError {
            namespace: namespace.map(str::to_string),
            field: None,
            tag: tag.to_string(),
            param: param.to_string(),
            kind: value.kind(),
            value,
        }
    }

    #[test]
    fn test_named_field_display() {
        let err = field_error(Some("TestStruct.Field1"), "required", "", Value::Int(0));
        assert_eq!(err.to_string(), "TestStruct.Field1 (required=)");
    }

    #[test]
    fn test_bare_value_display() {
        let err = field_error(None, "oneof", "debug info", Value::from("qwe"));
        assert_eq!(err.to_string(), "string qwe (oneof=debug info)");
    }

    #[test]
    fn test_nil_value_display() {
        let err = field_error(None, "oneof", "a b", Value::Nil);
        assert_eq!(err.to_string(), "nil value (oneof=a b)");
    }

    #[test]
    fn test_joined_display() {
        let errors = FieldErrors::new(vec![
            field_error(Some("S.A"), "required", "", Value::Int(0)),
            field_error(Some("S.B"), "oneof", "x y", Value::from("z")),
        ]);
        let err = ValidatorError::ValidationFailed(errors);
        assert_eq!(
            err.to_string(),
            "validation failed: S.A (required=), S.B (oneof=x y)"
        );
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: ValidatorError = EngineError::NotAStruct { kind: "int" }.into();
        assert!(matches!(err, ValidatorError::Unexpected(_)));
        assert!(err.to_string().starts_with("unexpected validation error: "));

        let err: ValidatorError = EngineError::Validation(FieldErrors::default()).into();
        assert!(err.field_errors().is_some());
    }

    #[test]
    fn test_registration_messages_pass_through() {
        let err: ValidatorError = RegistrationError::EmptyKey.into();
        assert_eq!(err.to_string(), "function Key cannot be empty");

        let err: ValidatorError = RegistrationError::EmptyFunction.into();
        assert_eq!(err.to_string(), "function cannot be empty");
    }
}
