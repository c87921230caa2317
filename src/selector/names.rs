//! Kubernetes name syntax for label keys and values.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const LABEL_VALUE_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

static QUALIFIED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap());
static LABEL_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").unwrap());
static DNS1123_SUBDOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});

/// Why a label key or value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    /// The key has more than one `/`.
    #[error(
        "a qualified name must consist of alphanumeric characters, '-', '_' or '.', \
         with an optional DNS subdomain prefix and '/'"
    )]
    TooManySegments,

    /// Nothing before the `/`.
    #[error("prefix part must be non-empty")]
    EmptyPrefix,

    /// The prefix is longer than a DNS subdomain may be.
    #[error("prefix part must be no more than {} characters", DNS1123_SUBDOMAIN_MAX_LENGTH)]
    PrefixTooLong,

    /// The prefix is not a lowercase DNS-1123 subdomain.
    #[error(
        "prefix part a lowercase RFC 1123 subdomain must consist of lower case alphanumeric \
         characters, '-' or '.', and must start and end with an alphanumeric character"
    )]
    InvalidPrefix,

    /// Nothing after the `/`, or an empty key.
    #[error("name part must be non-empty")]
    EmptyName,

    /// The name is longer than 63 characters.
    #[error("name part must be no more than {} characters", QUALIFIED_NAME_MAX_LENGTH)]
    NameTooLong,

    /// The name has characters outside `[-A-Za-z0-9_.]` or bad ends.
    #[error(
        "name part must consist of alphanumeric characters, '-', '_' or '.', \
         and must start and end with an alphanumeric character"
    )]
    InvalidName,

    /// The value is longer than 63 characters.
    #[error("must be no more than {} characters", LABEL_VALUE_MAX_LENGTH)]
    ValueTooLong,

    /// The value has characters outside `[-A-Za-z0-9_.]` or bad ends.
    #[error(
        "a valid label must be an empty string or consist of alphanumeric characters, \
         '-', '_' or '.', and must start and end with an alphanumeric character"
    )]
    InvalidValue,
}

/// Check a label key: `[prefix/]name`, prefix a DNS-1123 subdomain.
pub(crate) fn validate_label_key(key: &str) -> Result<(), NameError> {
    let name = match key.split('/').collect::<Vec<_>>().as_slice() {
        [name] => *name,
        [prefix, name] => {
            validate_prefix(prefix)?;
            *name
        }
        _ => return Err(NameError::TooManySegments),
    };

    if name.is_empty() {
        return Err(NameError::EmptyName);
    }
    if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        return Err(NameError::NameTooLong);
    }
    if !QUALIFIED_NAME_RE.is_match(name) {
        return Err(NameError::InvalidName);
    }
    Ok(())
}

/// Check a label value. The empty value is valid.
pub(crate) fn validate_label_value(value: &str) -> Result<(), NameError> {
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        return Err(NameError::ValueTooLong);
    }
    if !LABEL_VALUE_RE.is_match(value) {
        return Err(NameError::InvalidValue);
    }
    Ok(())
}

/// The prefix of a key must be a DNS-1123 subdomain.
fn validate_prefix(prefix: &str) -> Result<(), NameError> {
    if prefix.is_empty() {
        return Err(NameError::EmptyPrefix);
    }
    if prefix.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        return Err(NameError::PrefixTooLong);
    }
    if !DNS1123_SUBDOMAIN_RE.is_match(prefix) {
        return Err(NameError::InvalidPrefix);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_keys() {
        assert!(validate_label_key("app").is_ok());
        assert!(validate_label_key("app.kubernetes.io/name").is_ok());
        assert!(validate_label_key("Team_Name-1").is_ok());

        assert_eq!(validate_label_key(""), Err(NameError::EmptyName));
        assert_eq!(validate_label_key("/name"), Err(NameError::EmptyPrefix));
        assert_eq!(validate_label_key("app/"), Err(NameError::EmptyName));
        assert_eq!(validate_label_key("a/b/c"), Err(NameError::TooManySegments));
        assert_eq!(validate_label_key("-app"), Err(NameError::InvalidName));
        assert_eq!(
            validate_label_key("Example.com/name"),
            Err(NameError::InvalidPrefix)
        );

        let name = "a".repeat(64);
        assert_eq!(validate_label_key(&name), Err(NameError::NameTooLong));
        let prefixed = format!("{}/name", "a".repeat(254));
        assert_eq!(validate_label_key(&prefixed), Err(NameError::PrefixTooLong));
    }

    #[test]
    fn test_label_values() {
        assert!(validate_label_value("").is_ok());
        assert!(validate_label_value("prod").is_ok());
        assert!(validate_label_value("v1.2_3-rc").is_ok());

        assert_eq!(validate_label_value("prod-"), Err(NameError::InvalidValue));
        assert_eq!(validate_label_value("a b"), Err(NameError::InvalidValue));
        let value = "a".repeat(64);
        assert_eq!(validate_label_value(&value), Err(NameError::ValueTooLong));
    }

    #[test]
    fn test_reasons_read_like_kubernetes_messages() {
        assert_eq!(
            NameError::NameTooLong.to_string(),
            "name part must be no more than 63 characters"
        );
        assert_eq!(
            NameError::PrefixTooLong.to_string(),
            "prefix part must be no more than 253 characters"
        );
        let reason = NameError::InvalidPrefix.to_string();
        assert!(reason.starts_with("prefix part a lowercase"));
    }
}
