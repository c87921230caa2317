//! Rule tag parsing.
//!
//! A tag is a comma-separated list of elements. Each element is `omitempty`,
//! `dive`, or one or more `name[=param]` rules joined by `|` (any may pass).
//! A lone `-` skips the field entirely.

use crate::core::EngineError;

pub(crate) const OMIT_EMPTY: &str = "omitempty";
pub(crate) const DIVE: &str = "dive";
pub(crate) const SKIP: &str = "-";
pub(crate) const REQUIRED: &str = "required";

const ESCAPED_COMMA: &str = "0x2C";
const ESCAPED_PIPE: &str = "0x7C";

/// A parsed tag expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tag {
    pub(crate) skip: bool,
    pub(crate) elements: Vec<TagElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TagElement {
    OmitEmpty,
    Dive,
    Rules { names: String, any_of: Vec<Rule> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rule {
    pub(crate) name: String,
    pub(crate) param: String,
}

impl TagElement {
    /// Whether this element is a lone `required` rule.
    pub(crate) fn is_required(&self) -> bool {
        match self {
            Self::Rules { any_of, .. } => any_of.len() == 1 && any_of[0].name == REQUIRED,
            _ => false,
        }
    }

    /// Tag and param reported when this element fails.
    pub(crate) fn failure_tag(&self) -> (&str, &str) {
        match self {
            Self::OmitEmpty => (OMIT_EMPTY, ""),
            Self::Dive => (DIVE, ""),
            // An or-group reports its joined names with the last param.
            Self::Rules { names, any_of } => {
                let param = any_of.last().map_or("", |rule| rule.param.as_str());
                (names.as_str(), param)
            }
        }
    }
}

pub(crate) fn parse(tag: &str) -> Result<Tag, EngineError> {
    if tag == SKIP {
        return Ok(Tag {
            skip: true,
            elements: Vec::new(),
        });
    }
    if tag.is_empty() {
        return Ok(Tag {
            skip: false,
            elements: Vec::new(),
        });
    }

    let mut elements = Vec::new();
    for element in tag.split(',') {
        let parsed = match element {
            "" => return Err(invalid(tag, "empty tag element")),
            OMIT_EMPTY => TagElement::OmitEmpty,
            DIVE => TagElement::Dive,
            _ => parse_rules(tag, element)?,
        };
        elements.push(parsed);
    }

    Ok(Tag {
        skip: false,
        elements,
    })
}

fn parse_rules(tag: &str, element: &str) -> Result<TagElement, EngineError> {
    let mut any_of = Vec::new();
    for alternative in element.split('|') {
        let (name, param) = match alternative.split_once('=') {
            Some((name, param)) => (name, unescape_param(param)),
            None => (alternative, String::new()),
        };
        if name.is_empty() {
            return Err(invalid(tag, "rule without a name"));
        }
        if name == OMIT_EMPTY || name == DIVE {
            return Err(invalid(
                tag,
                &format!("'{}' cannot take part in an or-group", name),
            ));
        }
        any_of.push(Rule {
            name: name.to_string(),
            param,
        });
    }

    let names = any_of
        .iter()
        .map(|rule| rule.name.as_str())
        .collect::<Vec<_>>()
        .join("|");
    Ok(TagElement::Rules { names, any_of })
}

fn unescape_param(param: &str) -> String {
    param.replace(ESCAPED_COMMA, ",").replace(ESCAPED_PIPE, "|")
}

fn invalid(tag: &str, reason: &str) -> EngineError {
    EngineError::InvalidTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    }
}
