//! Rules registered with every new validator.

pub(crate) mod builtin;
pub(crate) mod custom;
