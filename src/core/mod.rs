//! Core validation types: values, the rule engine and the validator facade.

mod builder;
mod engine;
mod tag;
mod validator;
mod value;

pub use builder::{ValidatorBuilder, ValidatorOptions};
pub(crate) use engine::RuleEngine;
pub use engine::{EngineError, FieldLevel, Predicate};
pub use validator::Validator;
pub use value::{Field, Struct, Validatable, Value};
