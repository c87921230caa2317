//! Validation metrics tracking using OpenTelemetry.

use crate::error::{Result, ValidatorError};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for validation operations.
///
/// Every counter and the duration histogram carry an `operation` attribute:
/// `struct` for struct validation, `tag` for single values.
///
/// # Examples
///
/// ```rust,no_run
/// use tagcheck::metrics::ValidatorMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("tagcheck");
/// let metrics = ValidatorMetrics::new(meter);
///
/// let started = std::time::Instant::now();
/// // ... validate ...
/// metrics.record_validation("tag", started, &Ok(()));
/// ```
#[derive(Clone)]
pub struct ValidatorMetrics {
    validations: Counter<u64>,
    failures: Counter<u64>,
    unexpected: Counter<u64>,
    registrations: Counter<u64>,
    duration: Histogram<f64>,
}

impl ValidatorMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let validations = meter
            .u64_counter("tagcheck.validations")
            .with_description("Total number of validation calls")
            .build();

        let failures = meter
            .u64_counter("tagcheck.validation.failures")
            .with_description("Number of validation calls rejected by a rule")
            .build();

        let unexpected = meter
            .u64_counter("tagcheck.validation.unexpected")
            .with_description("Number of validation calls that hit an engine error")
            .build();

        let registrations = meter
            .u64_counter("tagcheck.registrations")
            .with_description("Number of rules registered at runtime")
            .build();

        let duration = meter
            .f64_histogram("tagcheck.validation.duration")
            .with_description("Duration of validation calls in seconds")
            .with_unit("s")
            .build();

        Self {
            validations,
            failures,
            unexpected,
            registrations,
            duration,
        }
    }

    /// Record a finished validation call.
    ///
    /// # Arguments
    ///
    /// * `operation` - `struct` or `tag`
    /// * `started` - When the call began
    /// * `result` - The outcome handed back to the caller
    pub fn record_validation(
        &self,
        operation: &'static str,
        started: Instant,
        result: &Result<()>,
    ) {
        let attributes = [KeyValue::new("operation", operation)];

        self.validations.add(1, &attributes);
        self.duration
            .record(started.elapsed().as_secs_f64(), &attributes);

        match result {
            Ok(()) => {}
            Err(ValidatorError::ValidationFailed(_)) => self.failures.add(1, &attributes),
            Err(_) => self.unexpected.add(1, &attributes),
        }
    }

    /// Record a successful rule registration.
    pub fn record_registration(&self) {
        self.registrations.add(1, &[]);
    }
}
