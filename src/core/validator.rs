//! The validator handle callers validate through.

use crate::core::{EngineError, FieldLevel, Predicate, RuleEngine, ValidatorBuilder, Value};
use crate::error::{Result, ValidatorError};
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::ValidatorMetrics;

/// A validator wrapping a shared rule engine.
///
/// Cloning is cheap and every clone sees the same rules, including ones
/// registered after the clone was taken. Validation never takes a lock;
/// registration is serialized internally.
///
/// # Examples
///
/// ```rust
/// use tagcheck::prelude::*;
///
/// let validator = Validator::new();
///
/// assert!(validator.validate_with_tag("https://localhost:8081", "url_prefix").is_ok());
///
/// let err = validator
///     .validate_with_tag("qwe", "oneof=debug info warn error")
///     .unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "validation failed: string qwe (oneof=debug info warn error)"
/// );
/// ```
#[derive(Clone)]
pub struct Validator {
    /// The rule engine, shared between clones
    engine: Arc<RuleEngine>,
    /// Optional metrics collector
    #[cfg(feature = "metrics")]
    metrics: Option<ValidatorMetrics>,
}

/// One validation call in flight.
#[cfg_attr(not(any(feature = "tracing", feature = "metrics")), allow(dead_code))]
struct Call {
    operation: &'static str,
    #[cfg(feature = "metrics")]
    started: std::time::Instant,
}

impl Validator {
    /// Create a validator with the built-in rules and default options.
    ///
    /// Use [`Validator::builder`] to change options or pre-register rules.
    pub fn new() -> Self {
        Self::from_engine(ValidatorBuilder::new().engine())
    }

    /// Create a new builder for constructing a validator.
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub(crate) fn from_engine(engine: RuleEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Attach a metrics collector.
    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: ValidatorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate a struct against the tags on its fields.
    ///
    /// Non-nil pointers are followed. Nested structs are validated too.
    ///
    /// # Errors
    ///
    /// - [`ValidatorError::NilInput`] for [`Value::Nil`]
    /// - [`ValidatorError::NilPointer`] for a pointer with no referent
    /// - [`ValidatorError::ValidationFailed`] listing every failing field in
    ///   declaration order
    /// - [`ValidatorError::Unexpected`] if the value is not a struct or a tag
    ///   is malformed or names an unknown rule
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagcheck::prelude::*;
    ///
    /// struct TestStruct {
    ///     field1: i64,
    ///     field2: String,
    /// }
    ///
    /// impl Validatable for TestStruct {
    ///     fn describe(&self) -> Struct {
    ///         Struct::new("TestStruct")
    ///             .field("Field1", "numeric,required,gt=1024,lt=65536", self.field1)
    ///             .field("Field2", "oneof=debug info warn error", self.field2.as_str())
    ///     }
    /// }
    ///
    /// let validator = Validator::new();
    /// let err = validator
    ///     .validate_struct(&TestStruct { field1: 0, field2: "test".into() })
    ///     .unwrap_err();
    ///
    /// assert_eq!(
    ///     err.to_string(),
    ///     "validation failed: TestStruct.Field1 (required=), TestStruct.Field2 (oneof=debug info warn error)"
    /// );
    /// ```
    pub fn validate_struct(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match value {
            Value::Nil => return Err(ValidatorError::NilInput),
            Value::Pointer(None) => return Err(ValidatorError::NilPointer),
            _ => {}
        }

        let call = self.start("struct");
        let result = self.engine.validate_struct(&value);
        self.finish(call, result)
    }

    /// Validate a single value against a tag expression.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ValidationFailed`] if the value breaks the
    /// tag, or [`ValidatorError::Unexpected`] if the tag is malformed or names
    /// an unknown rule.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagcheck::prelude::*;
    ///
    /// let validator = Validator::new();
    /// assert!(validator.validate_with_tag("debug", "oneof=debug info warn error").is_ok());
    /// assert!(validator.validate_with_tag(70000, "gt=1024,lt=65536").is_err());
    /// ```
    pub fn validate_with_tag(&self, value: impl Into<Value>, tag: &str) -> Result<()> {
        let value = value.into();
        let call = self.start("tag");
        let result = self.engine.validate_var(&value, tag);
        self.finish(call, result)
    }

    /// Register a rule under `tag`, replacing any rule of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Registration`] if the tag is empty or reserved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagcheck::prelude::*;
    ///
    /// let validator = Validator::new();
    /// validator
    ///     .register_validation("is-even", |fl| fl.field().as_i64().is_some_and(|n| n % 2 == 0))
    ///     .unwrap();
    ///
    /// assert!(validator.validate_with_tag(4, "is-even").is_ok());
    /// assert!(validator.validate_with_tag(3, "is-even").is_err());
    /// ```
    pub fn register_validation<F>(&self, tag: &str, predicate: F) -> Result<()>
    where
        F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(predicate);
        self.register_predicate(tag, Some(predicate))
    }

    /// Register an optional, already shared predicate under `tag`.
    ///
    /// # Errors
    ///
    /// Fails with the engine's message when the tag is empty
    /// (`function Key cannot be empty`), the predicate is `None`
    /// (`function cannot be empty`), or the tag is reserved.
    pub fn register_predicate(&self, tag: &str, predicate: Option<Predicate>) -> Result<()> {
        match self.engine.register(tag, predicate) {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(tag, "registered validation rule");
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_registration();
                }
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(tag, error = %err, "rejected validation rule");
                Err(err.into())
            }
        }
    }

    /// Whether a rule is registered under `tag`.
    pub fn has_rule(&self, tag: &str) -> bool {
        self.engine.has_rule(tag)
    }

    /// Names of all registered rules, sorted.
    pub fn rules(&self) -> Vec<String> {
        self.engine.rule_names()
    }

    fn start(&self, operation: &'static str) -> Call {
        Call {
            operation,
            #[cfg(feature = "metrics")]
            started: std::time::Instant::now(),
        }
    }

    #[cfg_attr(
        not(any(feature = "tracing", feature = "metrics")),
        allow(unused_variables)
    )]
    fn finish(&self, call: Call, result: std::result::Result<(), EngineError>) -> Result<()> {
        let result = result.map_err(ValidatorError::from);

        #[cfg(feature = "tracing")]
        if let Err(ValidatorError::Unexpected(err)) = &result {
            tracing::warn!(operation = call.operation, error = %err, "unexpected validation error");
        }

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_validation(call.operation, call.started, &result);
        }

        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.engine.rule_names())
            .finish()
    }
}
