//! Builder for constructing Validator instances.

use crate::core::{FieldLevel, Predicate, RuleEngine, Validator};
use crate::error::Result;
use crate::rules;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::ValidatorMetrics;

/// Options that shape a validator.
///
/// Deserializable so it can sit inside an application's own config file.
///
/// # Examples
///
/// ```rust
/// use tagcheck::core::ValidatorOptions;
///
/// let options = ValidatorOptions::default();
/// assert!(options.required_struct_enabled);
/// assert!(options.kubernetes_rules);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Apply a leading `required` to struct-typed fields.
    /// When off, that `required` is skipped; the field's other rules still run
    /// and its nested fields are still checked.
    pub required_struct_enabled: bool,
    /// Register `k8s_label_selector` and `k8s_field_selector`.
    pub kubernetes_rules: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            required_struct_enabled: true,
            kubernetes_rules: true,
        }
    }
}

/// Builder for constructing a [`Validator`].
///
/// # Examples
///
/// ```rust
/// use tagcheck::prelude::*;
///
/// let validator = Validator::builder()
///     .required_struct_enabled(false)
///     .with_validation("is-even", |fl| fl.field().as_i64().is_some_and(|n| n % 2 == 0))
///     .build()
///     .unwrap();
///
/// assert!(validator.validate_with_tag(2, "is-even").is_ok());
/// ```
pub struct ValidatorBuilder {
    options: ValidatorOptions,
    registrations: Vec<(String, Option<Predicate>)>,
    #[cfg(feature = "metrics")]
    metrics: Option<ValidatorMetrics>,
}

impl ValidatorBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ValidatorOptions::default(),
            registrations: Vec::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Replace all options at once.
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a leading `required` on struct-typed fields is applied.
    pub fn required_struct_enabled(mut self, enabled: bool) -> Self {
        self.options.required_struct_enabled = enabled;
        self
    }

    /// Leave out the Kubernetes selector rules.
    pub fn without_kubernetes_rules(mut self) -> Self {
        self.options.kubernetes_rules = false;
        self
    }

    /// Register a rule when the validator is built.
    ///
    /// Registration errors surface from [`ValidatorBuilder::build`].
    pub fn with_validation<F>(mut self, tag: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(predicate);
        self.registrations.push((tag.into(), Some(predicate)));
        self
    }

    /// Record validation metrics on `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(ValidatorMetrics::new(meter));
        self
    }

    /// Build the validator.
    ///
    /// # Errors
    ///
    /// Returns the first registration error among rules added with
    /// [`ValidatorBuilder::with_validation`].
    pub fn build(self) -> Result<Validator> {
        let engine = self.engine();
        for (tag, predicate) in self.registrations {
            engine.register(&tag, predicate)?;
        }

        let validator = Validator::from_engine(engine);

        #[cfg(feature = "metrics")]
        let validator = match self.metrics {
            Some(metrics) => validator.with_metrics(metrics),
            None => validator,
        };

        Ok(validator)
    }

    /// A rule engine holding the built-in rules for the current options.
    pub(crate) fn engine(&self) -> RuleEngine {
        let mut registry: HashMap<String, Predicate> = HashMap::new();
        for (tag, predicate) in rules::builtin::rules() {
            registry.insert(tag.to_string(), predicate);
        }
        for (tag, predicate) in rules::custom::rules(self.options.kubernetes_rules) {
            registry.insert(tag.to_string(), predicate);
        }
        RuleEngine::new(registry, self.options.required_struct_enabled)
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
