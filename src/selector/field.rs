//! Field selector parser.
//!
//! A field selector is a comma-separated list of `key=value`, `key==value`
//! or `key!=value` terms. Inside values a backslash escapes `\`, `,` and `=`.

use super::SelectorError;
use std::fmt;

/// Term operators, in the order they are tried at each position.
const TERM_OPERATORS: [(&str, FieldOperator); 3] = [
    ("!=", FieldOperator::NotEquals),
    ("==", FieldOperator::DoubleEquals),
    ("=", FieldOperator::Equals),
];

/// Operator of a field selector term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOperator {
    /// `=`
    Equals,
    /// `==`
    DoubleEquals,
    /// `!=`
    NotEquals,
}

impl FieldOperator {
    /// The operator as written.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::DoubleEquals => "==",
            Self::NotEquals => "!=",
        }
    }
}

/// One `key<op>value` term. The value is unescaped; the key is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    key: String,
    operator: FieldOperator,
    value: String,
}

impl FieldRequirement {
    /// The field key exactly as written, surrounding whitespace included.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The operator.
    pub fn operator(&self) -> FieldOperator {
        self.operator
    }

    /// The unescaped value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for FieldRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.key,
            self.operator.as_str(),
            escape_field_value(&self.value)
        )
    }
}

/// A parsed field selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
    empty_terms: usize,
}

impl FieldSelector {
    /// Non-empty terms in the order they were written.
    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }

    /// Whether the input held empty terms, as in `a=b,,c=d` or `a=b,`.
    pub fn has_empty_terms(&self) -> bool {
        self.empty_terms > 0
    }

    /// Whether the selector has no requirements.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", requirement)?;
        }
        Ok(())
    }
}

/// Parse a field selector such as `metadata.name=web,status.phase!=Failed`.
///
/// Empty terms are tolerated here and reported by
/// [`FieldSelector::has_empty_terms`].
///
/// # Errors
///
/// Fails if a term has no operator or a value holds an invalid escape or an
/// unescaped `,` or `=`.
///
/// # Examples
///
/// ```rust
/// use tagcheck::selector::{parse_field_selector, FieldOperator};
///
/// let selector = parse_field_selector(r"metadata.name=a\,b,status.phase!=Failed").unwrap();
/// let terms = selector.requirements();
/// assert_eq!(terms[0].value(), "a,b");
/// assert_eq!(terms[1].operator(), FieldOperator::NotEquals);
/// ```
pub fn parse_field_selector(selector: &str) -> Result<FieldSelector, SelectorError> {
    let mut parsed = FieldSelector::default();
    if selector.is_empty() {
        return Ok(parsed);
    }

    for term in split_terms(selector) {
        if term.is_empty() {
            parsed.empty_terms += 1;
            continue;
        }
        let (key, operator, raw) =
            split_term(term).ok_or_else(|| SelectorError::MissingOperator {
                selector: selector.to_string(),
                term: term.to_string(),
            })?;
        parsed.requirements.push(FieldRequirement {
            key: key.to_string(),
            operator,
            value: unescape_field_value(raw)?,
        });
    }
    Ok(parsed)
}

/// Escape `\`, `,` and `=` so the value survives a round trip.
pub fn escape_field_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Undo [`escape_field_value`].
///
/// # Errors
///
/// Fails on a backslash before anything other than `\`, `,` or `=`, a
/// trailing backslash, or an unescaped `,` or `=`.
pub fn unescape_field_value(value: &str) -> Result<String, SelectorError> {
    if !value.contains(['\\', ',', '=']) {
        return Ok(value.to_string());
    }

    let mut unescaped = String::with_capacity(value.len());
    let mut in_slash = false;
    for c in value.chars() {
        if in_slash {
            if !matches!(c, '\\' | ',' | '=') {
                return Err(SelectorError::InvalidEscape {
                    sequence: format!("\\{}", c),
                });
            }
            unescaped.push(c);
            in_slash = false;
            continue;
        }
        match c {
            '\\' => in_slash = true,
            ',' | '=' => return Err(SelectorError::UnescapedCharacter { character: c }),
            _ => unescaped.push(c),
        }
    }
    if in_slash {
        return Err(SelectorError::InvalidEscape {
            sequence: "\\".to_string(),
        });
    }
    Ok(unescaped)
}

/// Split on commas not preceded by a backslash.
fn split_terms(selector: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut start = 0;
    let mut in_slash = false;
    for (i, c) in selector.char_indices() {
        if in_slash {
            in_slash = false;
        } else if c == '\\' {
            in_slash = true;
        } else if c == ',' {
            terms.push(&selector[start..i]);
            start = i + 1;
        }
    }
    terms.push(&selector[start..]);
    terms
}

/// Split a term at the leftmost operator.
fn split_term(term: &str) -> Option<(&str, FieldOperator, &str)> {
    term.char_indices().find_map(|(i, _)| {
        let remaining = &term[i..];
        TERM_OPERATORS
            .iter()
            .find(|(op, _)| remaining.starts_with(*op))
            .map(|(op, operator)| (&term[..i], *operator, &term[i + op.len()..]))
    })
}
