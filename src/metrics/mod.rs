//! Built-in metrics for validation operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Validation calls and their duration
//! - Rule violations
//! - Unexpected engine errors
//! - Rule registrations
//!
//! # Examples
//!
//! ```rust,no_run
//! use tagcheck::prelude::*;
//! use opentelemetry::global;
//!
//! let validator = Validator::builder()
//!     .with_metrics(global::meter("my-app"))
//!     .build()
//!     .unwrap();
//!
//! let _ = validator.validate_with_tag(8080, "gt=1024");
//! ```

mod validator_metrics;

pub use validator_metrics::ValidatorMetrics;
