//! Native rule vocabulary.
//!
//! Length-style rules (`gt`, `min`, `len`, ...) compare character counts on
//! strings, element counts on lists and values on numbers. A param that does
//! not parse for the value's kind fails the rule.

use crate::core::{FieldLevel, Predicate, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static ALPHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static ALPHANUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,62}(?:\.[a-zA-Z0-9][a-zA-Z0-9-]{0,62})*$").unwrap()
});
static ONE_OF_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'[^']*'|\S+").unwrap());

type RuleFn = fn(&FieldLevel<'_>) -> bool;

/// All native rules, keyed by tag name.
pub(crate) fn rules() -> Vec<(&'static str, Predicate)> {
    let table: [(&'static str, RuleFn); 27] = [
        ("required", required),
        ("numeric", numeric),
        ("number", number),
        ("boolean", boolean),
        ("alpha", alpha),
        ("alphanum", alphanum),
        ("lowercase", lowercase),
        ("uppercase", uppercase),
        ("eq", eq),
        ("ne", ne),
        ("gt", gt),
        ("gte", gte),
        ("lt", lt),
        ("lte", lte),
        ("min", gte),
        ("max", lte),
        ("len", len),
        ("oneof", one_of),
        ("contains", contains),
        ("excludes", excludes),
        ("startswith", starts_with),
        ("endswith", ends_with),
        ("email", email),
        ("hostname", hostname),
        ("ip", ip),
        ("ipv4", ipv4),
        ("ipv6", ipv6),
    ];

    table
        .into_iter()
        .map(|(name, rule)| {
            let predicate: Predicate = Arc::new(rule);
            (name, predicate)
        })
        .collect()
}

fn required(fl: &FieldLevel<'_>) -> bool {
    !fl.original().is_zero()
}

fn numeric(fl: &FieldLevel<'_>) -> bool {
    match fl.field() {
        Value::String(s) => NUMERIC_RE.is_match(s),
        value => value.is_number(),
    }
}

fn number(fl: &FieldLevel<'_>) -> bool {
    match fl.field() {
        Value::String(s) => NUMBER_RE.is_match(s),
        value => value.is_number(),
    }
}

fn boolean(fl: &FieldLevel<'_>) -> bool {
    match fl.field() {
        Value::Bool(_) => true,
        Value::String(s) => parse_bool(s).is_some(),
        _ => false,
    }
}

fn alpha(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_str().is_some_and(|s| ALPHA_RE.is_match(s))
}

fn alphanum(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_str().is_some_and(|s| ALPHANUM_RE.is_match(s))
}

fn lowercase(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| !s.is_empty() && s == s.to_lowercase())
}

fn uppercase(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| !s.is_empty() && s == s.to_uppercase())
}

fn eq(fl: &FieldLevel<'_>) -> bool {
    match fl.field() {
        Value::String(s) => s == fl.param(),
        Value::Bool(b) => parse_bool(fl.param()).is_some_and(|p| p == *b),
        _ => compare(fl, Ordering::is_eq),
    }
}

fn ne(fl: &FieldLevel<'_>) -> bool {
    !eq(fl)
}

fn gt(fl: &FieldLevel<'_>) -> bool {
    compare(fl, Ordering::is_gt)
}

fn gte(fl: &FieldLevel<'_>) -> bool {
    compare(fl, Ordering::is_ge)
}

fn lt(fl: &FieldLevel<'_>) -> bool {
    compare(fl, Ordering::is_lt)
}

fn lte(fl: &FieldLevel<'_>) -> bool {
    compare(fl, Ordering::is_le)
}

fn len(fl: &FieldLevel<'_>) -> bool {
    compare(fl, Ordering::is_eq)
}

fn one_of(fl: &FieldLevel<'_>) -> bool {
    let mut options = ONE_OF_PARAM_RE
        .find_iter(fl.param())
        .map(|m| m.as_str().trim_matches('\''));

    match fl.field() {
        Value::String(s) => options.any(|o| o == s),
        Value::Int(n) => options.any(|o| o.parse::<i64>().is_ok_and(|p| p == *n)),
        Value::Uint(n) => options.any(|o| o.parse::<u64>().is_ok_and(|p| p == *n)),
        _ => false,
    }
}

fn contains(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_str().is_some_and(|s| s.contains(fl.param()))
}

fn excludes(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_str().is_some_and(|s| !s.contains(fl.param()))
}

fn starts_with(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| s.starts_with(fl.param()))
}

fn ends_with(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_str().is_some_and(|s| s.ends_with(fl.param()))
}

fn email(fl: &FieldLevel<'_>) -> bool {
    fl.field().as_str().is_some_and(|s| EMAIL_RE.is_match(s))
}

fn hostname(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| s.len() <= 253 && HOSTNAME_RE.is_match(s))
}

fn ip(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| s.parse::<IpAddr>().is_ok())
}

fn ipv4(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| s.parse::<Ipv4Addr>().is_ok())
}

fn ipv6(fl: &FieldLevel<'_>) -> bool {
    fl.field()
        .as_str()
        .is_some_and(|s| s.parse::<Ipv6Addr>().is_ok())
}

/// Compare the field against the param and test the ordering.
fn compare(fl: &FieldLevel<'_>, accept: fn(Ordering) -> bool) -> bool {
    let param = fl.param();
    let ordering = match fl.field() {
        value @ (Value::String(_) | Value::List(_)) => value
            .len()
            .zip(param.parse::<usize>().ok())
            .map(|(len, p)| len.cmp(&p)),
        Value::Int(n) => param.parse::<i64>().ok().map(|p| n.cmp(&p)),
        Value::Uint(n) => param.parse::<u64>().ok().map(|p| n.cmp(&p)),
        Value::Float(n) => param.parse::<f64>().ok().and_then(|p| n.partial_cmp(&p)),
        _ => None,
    };
    ordering.is_some_and(accept)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
