//! # tagcheck
//!
//! Tag-driven validation for structs and single values, with a lock-free rule
//! registry and Kubernetes selector rules.
//!
//! ## Overview
//!
//! `tagcheck` checks values against short rule expressions such as
//! `required,gt=1024,lt=65536`:
//! - Struct fields carry their rules as tags, described through [`Validatable`]
//! - Single values are checked against a tag given at the call site
//! - Custom rules can be registered at any time, from any thread
//! - Lookups never lock; registration copies the registry and swaps it in
//!
//! ## Quick Start
//!
//! ```rust
//! use tagcheck::prelude::*;
//!
//! struct Listener {
//!     port: u16,
//!     endpoint: String,
//!     level: String,
//! }
//!
//! impl Validatable for Listener {
//!     fn describe(&self) -> Struct {
//!         Struct::new("Listener")
//!             .field("port", "required,gt=1024,lt=65536", self.port)
//!             .field("endpoint", "url_prefix", self.endpoint.as_str())
//!             .field("level", "oneof=debug info warn error", self.level.as_str())
//!     }
//! }
//!
//! let listener = Listener {
//!     port: 8443,
//!     endpoint: "https://localhost:8443".into(),
//!     level: "info".into(),
//! };
//! assert!(tagcheck::validate_struct(&listener).is_ok());
//!
//! tagcheck::register_validation("is-even", |fl| {
//!     fl.field().as_i64().is_some_and(|n| n % 2 == 0)
//! })
//! .unwrap();
//! assert!(tagcheck::validate_with_tag(4, "is-even").is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `kubernetes` (default): the `k8s_label_selector` and
//!   `k8s_field_selector` rules and the [`selector`] module
//! - `tracing` (default): log registrations and engine errors with `tracing`
//! - `metrics`: OpenTelemetry counters and latency histograms

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
mod rules;
mod shared;

#[cfg(feature = "kubernetes")]
pub mod selector;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use rules::custom::URL_PREFIX;
#[cfg(feature = "kubernetes")]
pub use rules::custom::{K8S_FIELD_SELECTOR, K8S_LABEL_SELECTOR};
pub use shared::{
    register_predicate, register_validation, shared, validate_struct, validate_with_tag,
};

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        FieldLevel, Predicate, Struct, Validatable, Validator, ValidatorBuilder, ValidatorOptions,
        Value,
    };
    pub use crate::error::{FieldError, FieldErrors, Result, ValidatorError};
}
