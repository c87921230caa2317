//! Integration tests for runtime registration and the shared validator.

use std::sync::Arc;
use std::thread;
use tagcheck::prelude::*;

fn is_even(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_i64().is_some_and(|n| n % 2 == 0)
}

#[test]
fn test_registered_rule_is_applied() {
    tagcheck::register_validation("is-even", is_even).unwrap();

    assert!(tagcheck::validate_with_tag(4, "is-even").is_ok());

    let err = tagcheck::validate_with_tag(3, "is-even").unwrap_err();
    assert!(err.to_string().contains("is-even"));
    assert_eq!(err.to_string(), "validation failed: int 3 (is-even=)");
}

#[test]
fn test_registration_errors() {
    let err = tagcheck::register_validation("", is_even).unwrap_err();
    assert_eq!(err.to_string(), "function Key cannot be empty");

    let err = tagcheck::register_predicate("tag", None).unwrap_err();
    assert_eq!(err.to_string(), "function cannot be empty");

    for tag in ["omitempty", "dive", "-", "required", "a,b", "a|b", "a=b"] {
        let err = tagcheck::register_validation(tag, is_even).unwrap_err();
        assert!(
            matches!(err, ValidatorError::Registration(_)),
            "{tag:?} should be restricted"
        );
    }
}

#[test]
fn test_registration_replaces_existing_rule() {
    let validator = Validator::new();
    validator.register_validation("flag", |_| false).unwrap();
    assert!(validator.validate_with_tag(1, "flag").is_err());

    validator.register_validation("flag", |_| true).unwrap();
    assert!(validator.validate_with_tag(1, "flag").is_ok());
}

#[test]
fn test_rule_sees_parameter_and_parent() {
    struct Range {
        low: i64,
        high: i64,
    }

    impl Validatable for Range {
        fn describe(&self) -> Struct {
            Struct::new("Range")
                .field("low", "required", self.low)
                .field("high", "above=low", self.high)
        }
    }

    let validator = Validator::new();
    validator
        .register_validation("above", |fl| {
            let other = fl.parent().and_then(|p| p.get(fl.param()));
            match (fl.field().as_i64(), other.and_then(Value::as_i64)) {
                (Some(value), Some(other)) => value > other,
                _ => false,
            }
        })
        .unwrap();

    let ordered = Range { low: 1, high: 5 };
    assert!(validator.validate_struct(&ordered).is_ok());
    let err = validator
        .validate_struct(&Range { low: 5, high: 1 })
        .unwrap_err();
    assert_eq!(err.to_string(), "validation failed: Range.high (above=low)");
}

#[test]
fn test_concurrent_registration_loses_nothing() {
    let validator = Validator::new();
    let before = validator.rules().len();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let validator = validator.clone();
            thread::spawn(move || {
                validator
                    .register_validation(&format!("concurrent-{}", i), is_even)
                    .unwrap();
                validator.validate_with_tag(2, "required,gt=1").unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(validator.rules().len(), before + 16);
    for i in 0..16 {
        assert!(validator.has_rule(&format!("concurrent-{}", i)));
    }
}

#[test]
fn test_validation_runs_alongside_registration() {
    let validator = Arc::new(Validator::new());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let validator = Arc::clone(&validator);
            thread::spawn(move || {
                for _ in 0..500 {
                    let result = validator.validate_with_tag("info", "oneof=debug info");
                    assert!(result.is_ok());
                }
            })
        })
        .collect();

    for i in 0..50 {
        validator
            .register_validation(&format!("churn-{}", i), |_| true)
            .unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_shared_validator_has_default_rules() {
    let rules = tagcheck::shared().rules();
    for tag in [
        "required",
        "gt",
        "oneof",
        "url_prefix",
        "k8s_label_selector",
        "k8s_field_selector",
    ] {
        assert!(rules.iter().any(|r| r == tag), "missing {tag}");
    }
}
