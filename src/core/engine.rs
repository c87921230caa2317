//! The rule engine: tag name to predicate registry plus the value walker.

use crate::core::tag::{self, TagElement};
use crate::core::{Struct, Value};
use crate::error::{FieldError, FieldErrors, RegistrationError};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A rule predicate. Returns `true` when the field satisfies the rule.
pub type Predicate = Arc<dyn Fn(&FieldLevel<'_>) -> bool + Send + Sync>;

/// Tags that carry meaning in the tag grammar and cannot be re-registered.
const RESTRICTED_TAGS: &[&str] = &[
    tag::OMIT_EMPTY,
    tag::DIVE,
    tag::SKIP,
    tag::REQUIRED,
    "0x2C",
    "0x7C",
];

const RESTRICTED_CHARS: &str = ".[],|=+()`~!@#$%^&*\\\"/?<>{};:'";

/// Errors produced by the rule engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// One or more fields failed their rules.
    #[error("{0}")]
    Validation(FieldErrors),

    /// Struct validation was asked to validate something that is not a struct.
    #[error("expected a struct, got {kind}")]
    NotAStruct {
        /// Kind of the value that was passed.
        kind: &'static str,
    },

    /// A tag names a rule that is not registered.
    #[error("undefined validation function '{tag}' on field '{field}'")]
    UndefinedTag {
        /// The unknown rule name.
        tag: String,
        /// Field path, or the value kind for bare values.
        field: String,
    },

    /// A tag expression could not be parsed.
    #[error("invalid validation tag '{tag}': {reason}")]
    InvalidTag {
        /// The full tag expression.
        tag: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `dive` was applied to a value that is not a list.
    #[error("cannot dive into {kind} on field '{field}'")]
    DiveOnNonList {
        /// Kind of the value.
        kind: &'static str,
        /// Field path, or the value kind for bare values.
        field: String,
    },
}

/// What a predicate sees of the value under validation.
///
/// # Examples
///
/// ```rust
/// use tagcheck::core::FieldLevel;
///
/// fn is_even(fl: &FieldLevel<'_>) -> bool {
///     fl.field().as_i64().is_some_and(|n| n % 2 == 0)
/// }
/// ```
pub struct FieldLevel<'a> {
    value: &'a Value,
    tag: &'a str,
    param: &'a str,
    field_name: Option<&'a str>,
    parent: Option<&'a Struct>,
}

impl<'a> FieldLevel<'a> {
    /// Build a field level by hand, mostly useful for testing predicates.
    pub fn new(value: &'a Value, tag: &'a str, param: &'a str) -> Self {
        Self {
            value,
            tag,
            param,
            field_name: None,
            parent: None,
        }
    }

    /// The value, with pointers followed.
    pub fn field(&self) -> &'a Value {
        self.value.indirect()
    }

    /// The value as declared, pointers included.
    pub fn original(&self) -> &'a Value {
        self.value
    }

    /// The rule name being evaluated.
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    /// The rule parameter, empty when none was given.
    pub fn param(&self) -> &'a str {
        self.param
    }

    /// Name of the field, when validating a struct.
    pub fn field_name(&self) -> Option<&'a str> {
        self.field_name
    }

    /// The struct that owns the field, when validating a struct.
    pub fn parent(&self) -> Option<&'a Struct> {
        self.parent
    }
}

/// Registry of rules and the entry points that apply them.
///
/// Reads load the registry lock-free. Registration is serialized by a mutex
/// and publishes a new copy of the registry.
pub(crate) struct RuleEngine {
    rules: ArcSwap<HashMap<String, Predicate>>,
    registration: Mutex<()>,
    required_struct_enabled: bool,
}

impl RuleEngine {
    pub(crate) fn new(rules: HashMap<String, Predicate>, required_struct_enabled: bool) -> Self {
        Self {
            rules: ArcSwap::from_pointee(rules),
            registration: Mutex::new(()),
            required_struct_enabled,
        }
    }

    /// Register `predicate` under `tag`, replacing any previous rule of that name.
    pub(crate) fn register(
        &self,
        tag: &str,
        predicate: Option<Predicate>,
    ) -> Result<(), RegistrationError> {
        if tag.is_empty() {
            return Err(RegistrationError::EmptyKey);
        }
        let predicate = predicate.ok_or(RegistrationError::EmptyFunction)?;
        if RESTRICTED_TAGS.contains(&tag) || tag.contains(|c: char| RESTRICTED_CHARS.contains(c)) {
            return Err(RegistrationError::Restricted(tag.to_string()));
        }

        let _guard = self.registration.lock();
        let mut next = HashMap::clone(&self.rules.load());
        next.insert(tag.to_string(), predicate);
        self.rules.store(Arc::new(next));
        Ok(())
    }

    pub(crate) fn has_rule(&self, tag: &str) -> bool {
        self.rules.load().contains_key(tag)
    }

    pub(crate) fn rule_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate every tagged field of a struct, walking nested structs.
    pub(crate) fn validate_struct(&self, value: &Value) -> Result<(), EngineError> {
        let Some(s) = value.as_struct() else {
            return Err(EngineError::NotAStruct {
                kind: value.indirect().kind(),
            });
        };

        let rules = self.rules.load();
        let mut walker = Walker::new(&rules, self.required_struct_enabled);
        walker.walk_struct(s, s.name)?;
        walker.finish()
    }

    /// Validate a single value against a tag expression.
    pub(crate) fn validate_var(&self, value: &Value, tag: &str) -> Result<(), EngineError> {
        let tag = tag::parse(tag)?;
        if tag.skip {
            return Ok(());
        }

        let rules = self.rules.load();
        let mut walker = Walker::new(&rules, self.required_struct_enabled);
        walker.check(value, &tag.elements, &Location::default())?;
        walker.finish()
    }
}

/// Where the value under check sits.
#[derive(Default)]
struct Location<'a> {
    namespace: Option<&'a str>,
    field_name: Option<&'a str>,
    parent: Option<&'a Struct>,
}

impl Location<'_> {
    fn describe(&self, value: &Value) -> String {
        self.namespace
            .map(str::to_string)
            .unwrap_or_else(|| value.indirect().kind().to_string())
    }
}

struct Walker<'e> {
    rules: &'e HashMap<String, Predicate>,
    required_struct_enabled: bool,
    errors: Vec<FieldError>,
}

impl<'e> Walker<'e> {
    fn new(rules: &'e HashMap<String, Predicate>, required_struct_enabled: bool) -> Self {
        Self {
            rules,
            required_struct_enabled,
            errors: Vec::new(),
        }
    }

    fn finish(self) -> Result<(), EngineError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(FieldErrors::new(self.errors)))
        }
    }

    fn walk_struct(&mut self, s: &Struct, prefix: &str) -> Result<(), EngineError> {
        for field in &s.fields {
            let tag = tag::parse(field.tag)?;
            if tag.skip {
                continue;
            }

            let namespace = format!("{}.{}", prefix, field.name);
            let location = Location {
                namespace: Some(&namespace),
                field_name: Some(field.name),
                parent: Some(s),
            };
            self.check(&field.value, &tag.elements, &location)?;
        }
        Ok(())
    }

    /// Apply `elements` to `value`, stopping at the first failing element.
    fn check(
        &mut self,
        value: &Value,
        elements: &[TagElement],
        location: &Location<'_>,
    ) -> Result<(), EngineError> {
        let target = value.indirect();
        // A struct-typed field may opt out of a leading `required`.
        let skip_required = !self.required_struct_enabled
            && matches!(target, Value::Struct(_))
            && elements.first().is_some_and(TagElement::is_required);
        let elements = if skip_required {
            &elements[1..]
        } else {
            elements
        };

        for (i, element) in elements.iter().enumerate() {
            match element {
                TagElement::OmitEmpty => {
                    if value.is_zero() {
                        return Ok(());
                    }
                }
                TagElement::Dive => return self.dive(value, &elements[i + 1..], location),
                TagElement::Rules { any_of, .. } => {
                    if value.is_nil() {
                        self.fail(value, element, location);
                        return Ok(());
                    }

                    let mut passed = false;
                    for rule in any_of {
                        let predicate = self.rules.get(&rule.name).ok_or_else(|| {
                            EngineError::UndefinedTag {
                                tag: rule.name.clone(),
                                field: location.describe(value),
                            }
                        })?;
                        let field_level = FieldLevel {
                            value,
                            tag: &rule.name,
                            param: &rule.param,
                            field_name: location.field_name,
                            parent: location.parent,
                        };
                        if predicate(&field_level) {
                            passed = true;
                            break;
                        }
                    }

                    if !passed {
                        self.fail(value, element, location);
                        return Ok(());
                    }
                }
            }
        }

        if let Value::Struct(inner) = target {
            let prefix = location.namespace.unwrap_or(inner.name);
            self.walk_struct(inner, prefix)?;
        }
        Ok(())
    }

    fn dive(
        &mut self,
        value: &Value,
        rest: &[TagElement],
        location: &Location<'_>,
    ) -> Result<(), EngineError> {
        if value.is_nil() {
            return Ok(());
        }
        let Some(items) = value.as_list() else {
            return Err(EngineError::DiveOnNonList {
                kind: value.indirect().kind(),
                field: location.describe(value),
            });
        };

        for (i, item) in items.iter().enumerate() {
            let namespace = location.namespace.map(|ns| format!("{}[{}]", ns, i));
            let field_name = location.field_name.map(|name| format!("{}[{}]", name, i));
            let item_location = Location {
                namespace: namespace.as_deref(),
                field_name: field_name.as_deref(),
                parent: location.parent,
            };
            self.check(item, rest, &item_location)?;
        }
        Ok(())
    }

    fn fail(&mut self, value: &Value, element: &TagElement, location: &Location<'_>) {
        let (tag, param) = element.failure_tag();
        let target = value.indirect();
        self.errors.push(FieldError {
            namespace: location.namespace.map(str::to_string),
            field: location.field_name.map(str::to_string),
            tag: tag.to_string(),
            param: param.to_string(),
            kind: target.kind(),
            value: target.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RuleEngine {
        let mut rules: HashMap<String, Predicate> = HashMap::new();
        rules.insert(
            "required".to_string(),
            Arc::new(|fl: &FieldLevel<'_>| !fl.field().is_zero()),
        );
        rules.insert(
            "short".to_string(),
            Arc::new(|fl: &FieldLevel<'_>| fl.field().len().is_some_and(|n| n < 4)),
        );
        RuleEngine::new(rules, true)
    }

    fn is_even() -> Predicate {
        Arc::new(|fl: &FieldLevel<'_>| fl.field().as_i64().is_some_and(|n| n % 2 == 0))
    }

    #[test]
    fn test_register_and_use() {
        let engine = engine();
        engine.register("is-even", Some(is_even())).unwrap();

        assert!(engine.has_rule("is-even"));
        let even = Value::from(4);
        let odd = Value::from(3);
        assert!(engine.validate_var(&even, "is-even").is_ok());
        assert!(matches!(
            engine.validate_var(&odd, "is-even"),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let engine = engine();
        assert_eq!(
            engine.register("", Some(is_even())),
            Err(RegistrationError::EmptyKey)
        );
        assert_eq!(
            engine.register("is-even", None),
            Err(RegistrationError::EmptyFunction)
        );
        assert!(matches!(
            engine.register("omitempty", Some(is_even())),
            Err(RegistrationError::Restricted(_))
        ));
        assert!(matches!(
            engine.register("a|b", Some(is_even())),
            Err(RegistrationError::Restricted(_))
        ));
    }

    #[test]
    fn test_undefined_tag_is_an_engine_error() {
        let value = Value::from("x");
        let err = engine().validate_var(&value, "nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "undefined validation function 'nope' on field 'string'"
        );
    }

    #[test]
    fn test_not_a_struct() {
        let err = engine().validate_struct(&Value::from(1)).unwrap_err();
        assert_eq!(err, EngineError::NotAStruct { kind: "int" });
    }

    #[test]
    fn test_first_failing_element_is_reported() {
        let err = engine()
            .validate_var(&Value::from(""), "required,short")
            .unwrap_err();
        let EngineError::Validation(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().tag, "required");
    }

    #[test]
    fn test_or_group_passes_if_any_passes() {
        let engine = engine();
        let long = Value::from("toolong");
        let empty = Value::from("");
        assert!(engine.validate_var(&long, "short|required").is_ok());
        assert!(engine.validate_var(&empty, "short|required").is_ok());
    }

    #[test]
    fn test_or_group_failure_reports_names_and_last_param() {
        let engine = engine();
        engine.register("gt", Some(is_even())).unwrap();

        let value = Value::from(3);
        let err = engine.validate_var(&value, "short|gt=1024").unwrap_err();
        assert_eq!(err.to_string(), "int 3 (short|gt=1024)");
    }

    #[test]
    fn test_omitempty_skips_zero_values() {
        let engine = engine();
        let empty = Value::from("");
        let null = Value::null_ptr();
        assert!(engine.validate_var(&empty, "omitempty,required").is_ok());
        assert!(engine.validate_var(&null, "omitempty,short").is_ok());
    }

    #[test]
    fn test_nil_fails_first_rule() {
        let err = engine().validate_var(&Value::Nil, "short").unwrap_err();
        assert_eq!(err.to_string(), "nil value (short=)");
    }

    #[test]
    fn test_dive_into_list() {
        let value = Value::from(vec!["ok", "toolong", "no"]);
        let err = engine().validate_var(&value, "dive,short").unwrap_err();
        assert_eq!(err.to_string(), "string toolong (short=)");

        let value = Value::from(5);
        let err = engine().validate_var(&value, "dive,short").unwrap_err();
        assert!(matches!(
            err,
            EngineError::DiveOnNonList { kind: "int", .. }
        ));
    }

    #[test]
    fn test_concurrent_registration_keeps_every_rule() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let name = format!("rule-{}", i);
                    engine.register(&name, Some(is_even())).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            assert!(engine.has_rule(&format!("rule-{}", i)));
        }
        assert_eq!(engine.rule_names().len(), 10);
    }

    #[test]
    fn test_required_on_struct_field_can_be_disabled() {
        let mut rules = HashMap::clone(&engine().rules.load());
        rules.insert("never".to_string(), Arc::new(|_: &FieldLevel<'_>| false));
        let lenient = RuleEngine::new(rules.clone(), false);
        let strict = RuleEngine::new(rules, true);

        let inner = Struct::new("Inner");
        let outer = Value::from(Struct::new("Outer").field("inner", "required", inner));
        assert!(lenient.validate_struct(&outer).is_ok());
        let err = strict.validate_struct(&outer).unwrap_err();
        assert_eq!(err.to_string(), "Outer.inner (required=)");

        // Only the leading `required` is dropped; later rules still run.
        let inner = Struct::new("Inner");
        let tagged = Struct::new("Outer").field("inner", "required,never", inner);
        let err = lenient.validate_struct(&Value::from(tagged)).unwrap_err();
        assert_eq!(err.to_string(), "Outer.inner (never=)");
    }
}
