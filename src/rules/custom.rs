//! Domain rules layered on top of the native vocabulary.
//!
//! - `url_prefix`: the string starts with `http://` or `https://`.
//! - `k8s_label_selector`: a non-empty, well-formed Kubernetes label selector.
//! - `k8s_field_selector`: a non-empty Kubernetes field selector that only
//!   filters on indexable fields with `=`, `==` or `!=`.

use crate::core::{FieldLevel, Predicate};
use std::sync::Arc;

#[cfg(feature = "kubernetes")]
use crate::selector;

/// Tag of the URL scheme prefix rule.
pub const URL_PREFIX: &str = "url_prefix";
/// Tag of the label selector rule.
#[cfg(feature = "kubernetes")]
pub const K8S_LABEL_SELECTOR: &str = "k8s_label_selector";
/// Tag of the field selector rule.
#[cfg(feature = "kubernetes")]
pub const K8S_FIELD_SELECTOR: &str = "k8s_field_selector";

/// Domain rules, keyed by tag name.
#[cfg_attr(not(feature = "kubernetes"), allow(unused_variables, unused_mut))]
pub(crate) fn rules(kubernetes: bool) -> Vec<(&'static str, Predicate)> {
    let mut rules = vec![rule(URL_PREFIX, url_prefix)];

    #[cfg(feature = "kubernetes")]
    if kubernetes {
        rules.push(rule(K8S_LABEL_SELECTOR, label_selector));
        rules.push(rule(K8S_FIELD_SELECTOR, field_selector));
    }

    rules
}

fn rule(name: &'static str, f: fn(&FieldLevel<'_>) -> bool) -> (&'static str, Predicate) {
    let predicate: Predicate = Arc::new(f);
    (name, predicate)
}

fn url_prefix(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| s.starts_with("http://") || s.starts_with("https://"))
}

#[cfg(feature = "kubernetes")]
fn label_selector(fl: &FieldLevel<'_>) -> bool {
    match fl.field().as_str() {
        Some("") | None => false,
        Some(s) => selector::parse_label_selector(s).is_ok(),
    }
}

#[cfg(feature = "kubernetes")]
fn field_selector(fl: &FieldLevel<'_>) -> bool {
    let Some(value) = fl.field().as_str() else {
        return false;
    };
    if value.is_empty() {
        return false;
    }

    // Syntax first; empty terms are skipped by the grammar but fail here.
    let Ok(selector) = selector::parse_field_selector(value) else {
        return false;
    };
    if selector.has_empty_terms() {
        return false;
    }

    selector
        .requirements()
        .iter()
        .all(|r| selector::is_indexable_field(r.key().trim()))
}
