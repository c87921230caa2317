//! Label selector lexer and parser.
//!
//! Accepts the Kubernetes label selector grammar:
//!
//! ```text
//! selector    := requirement ( ',' requirement )*
//! requirement := ['!'] key
//!              | key ( '=' | '==' | '!=' | '>' | '<' ) value
//!              | key ( 'in' | 'notin' ) '(' values ')'
//! ```

use super::SelectorError;
use super::names::{validate_label_key, validate_label_value};
use std::collections::BTreeSet;
use std::fmt;

/// Operator of a single label requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOperator {
    /// `key`
    Exists,
    /// `!key`
    DoesNotExist,
    /// `key=value`
    Equals,
    /// `key==value`
    DoubleEquals,
    /// `key!=value`
    NotEquals,
    /// `key in (a,b)`
    In,
    /// `key notin (a,b)`
    NotIn,
    /// `key>N`
    GreaterThan,
    /// `key<N`
    LessThan,
}

/// One parsed requirement, e.g. `tier in (web,api)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRequirement {
    key: String,
    operator: LabelOperator,
    values: Vec<String>,
}

impl LabelRequirement {
    /// The label key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The operator.
    pub fn operator(&self) -> LabelOperator {
        self.operator
    }

    /// Values, sorted and deduplicated. Empty for existence checks.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn new(
        key: String,
        operator: LabelOperator,
        values: Vec<String>,
    ) -> Result<Self, SelectorError> {
        validate_label_key(&key).map_err(|reason| SelectorError::InvalidKey {
            key: key.clone(),
            reason,
        })?;

        match operator {
            LabelOperator::In | LabelOperator::NotIn => {
                if values.is_empty() {
                    return Err(SelectorError::EmptyValues { key });
                }
            }
            LabelOperator::Equals | LabelOperator::DoubleEquals | LabelOperator::NotEquals => {
                if values.len() != 1 {
                    return Err(SelectorError::SingleValue { key });
                }
            }
            LabelOperator::Exists | LabelOperator::DoesNotExist => {
                if !values.is_empty() {
                    return Err(SelectorError::UnexpectedValues { key });
                }
            }
            LabelOperator::GreaterThan | LabelOperator::LessThan => {
                if values.len() != 1 {
                    return Err(SelectorError::SingleValue { key });
                }
                if values[0].parse::<i64>().is_err() {
                    return Err(SelectorError::NonIntegerValue {
                        value: values[0].clone(),
                    });
                }
            }
        }

        for value in &values {
            validate_label_value(value).map_err(|reason| SelectorError::InvalidValue {
                value: value.clone(),
                reason,
            })?;
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }
}

impl fmt::Display for LabelRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let single = self.values.first().map(String::as_str).unwrap_or_default();
        match self.operator {
            LabelOperator::Exists => f.write_str(&self.key),
            LabelOperator::DoesNotExist => write!(f, "!{}", self.key),
            LabelOperator::Equals => write!(f, "{}={}", self.key, single),
            LabelOperator::DoubleEquals => write!(f, "{}=={}", self.key, single),
            LabelOperator::NotEquals => write!(f, "{}!={}", self.key, single),
            LabelOperator::GreaterThan => write!(f, "{}>{}", self.key, single),
            LabelOperator::LessThan => write!(f, "{}<{}", self.key, single),
            LabelOperator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            LabelOperator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
        }
    }
}

/// A parsed label selector. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<LabelRequirement>,
}

impl LabelSelector {
    /// Requirements in the order they were written.
    pub fn requirements(&self) -> &[LabelRequirement] {
        &self.requirements
    }

    /// Whether the selector has no requirements.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl fmt::Display for LabelSelector {
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

/// Parse a label selector such as `env=prod,tier in (web,api),!canary`.
///
/// Empty or whitespace-only input is the empty selector.
///
/// # Errors
///
/// Returns a [`SelectorError`] describing the first syntax or name problem.
///
/// # Examples
///
/// ```rust
/// use tagcheck::selector::{parse_label_selector, LabelOperator};
///
/// let selector = parse_label_selector("env=prod,tier in (web,api)").unwrap();
/// assert_eq!(selector.requirements().len(), 2);
/// assert_eq!(selector.requirements()[1].operator(), LabelOperator::In);
///
/// assert!(parse_label_selector("env in prod").is_err());
/// ```
pub fn parse_label_selector(selector: &str) -> Result<LabelSelector, SelectorError> {
    Parser::new(selector).parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Identifier(String),
    Bang,
    Equals,
    DoubleEquals,
    NotEquals,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    OpenParen,
    CloseParen,
    Comma,
    End,
    Invalid(String),
}

impl Token {
    fn literal(&self) -> &str {
        match self {
            Self::Identifier(s) | Self::Invalid(s) => s,
            Self::Bang => "!",
            Self::Equals => "=",
            Self::DoubleEquals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::Comma => ",",
            Self::End => "",
        }
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '=' | '!' | '(' | ')' | ',' | '>' | '<')
}

fn lex(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if is_special(c) {
            let next = chars.get(pos + 1).copied();
            let (token, width) = match (c, next) {
                ('=', Some('=')) => (Token::DoubleEquals, 2),
                ('!', Some('=')) => (Token::NotEquals, 2),
                ('=', _) => (Token::Equals, 1),
                ('!', _) => (Token::Bang, 1),
                ('(', _) => (Token::OpenParen, 1),
                (')', _) => (Token::CloseParen, 1),
                (',', _) => (Token::Comma, 1),
                ('>', _) => (Token::GreaterThan, 1),
                ('<', _) => (Token::LessThan, 1),
                _ => (Token::Invalid(c.to_string()), 1),
            };
            tokens.push(token);
            pos += width;
            continue;
        }

        let start = pos;
        while pos < chars.len() && !chars[pos].is_whitespace() && !is_special(chars[pos]) {
            pos += 1;
        }
        let word: String = chars[start..pos].iter().collect();
        tokens.push(match word.as_str() {
            "in" => Token::In,
            "notin" => Token::NotIn,
            _ => Token::Identifier(word),
        });
    }

    tokens.push(Token::End);
    tokens
}

/// Where the parser is; keywords only count as keywords next to a key.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    KeyAndOperator,
    Values,
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            tokens: lex(input),
            position: 0,
        }
    }

    fn lookahead(&self, context: Context) -> Token {
        let token = match self.tokens.get(self.position) {
            Some(token) => token.clone(),
            None => Token::End,
        };
        Self::in_context(token, context)
    }

    fn consume(&mut self, context: Context) -> Token {
        let token = self.lookahead(context);
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn in_context(token: Token, context: Context) -> Token {
        match (context, token) {
            (Context::Values, Token::In) => Token::Identifier("in".to_string()),
            (Context::Values, Token::NotIn) => Token::Identifier("notin".to_string()),
            (_, token) => token,
        }
    }

    fn parse(mut self) -> Result<LabelSelector, SelectorError> {
        let mut requirements = Vec::new();
        loop {
            match self.lookahead(Context::Values) {
                Token::Identifier(_) | Token::Bang => {
                    requirements.push(self.parse_requirement()?);
                    match self.consume(Context::Values) {
                        Token::End => break,
                        Token::Comma => match self.lookahead(Context::Values) {
                            Token::Identifier(_) | Token::Bang => {}
                            other => return Err(unexpected(&other, "identifier after ','")),
                        },
                        other => return Err(unexpected(&other, "',' or 'end of string'")),
                    }
                }
                Token::End => break,
                other => return Err(unexpected(&other, "!, identifier, or 'end of string'")),
            }
        }
        Ok(LabelSelector { requirements })
    }

    fn parse_requirement(&mut self) -> Result<LabelRequirement, SelectorError> {
        let (key, inferred) = self.parse_key_and_infer_operator()?;
        if let Some(operator) = inferred {
            return LabelRequirement::new(key, operator, Vec::new());
        }

        let operator = self.parse_operator()?;
        let values = match operator {
            LabelOperator::In | LabelOperator::NotIn => self.parse_values()?,
            _ => self.parse_exact_value()?,
        };
        LabelRequirement::new(key, operator, values)
    }

    fn parse_key_and_infer_operator(
        &mut self,
    ) -> Result<(String, Option<LabelOperator>), SelectorError> {
        let mut operator = None;
        let mut token = self.consume(Context::Values);
        if token == Token::Bang {
            operator = Some(LabelOperator::DoesNotExist);
            token = self.consume(Context::Values);
        }

        let key = match token {
            Token::Identifier(key) => key,
            other => return Err(unexpected(&other, "identifier")),
        };
        validate_label_key(&key).map_err(|reason| SelectorError::InvalidKey {
            key: key.clone(),
            reason,
        })?;

        if matches!(self.lookahead(Context::Values), Token::End | Token::Comma)
            && operator.is_none()
        {
            operator = Some(LabelOperator::Exists);
        }
        Ok((key, operator))
    }

    fn parse_operator(&mut self) -> Result<LabelOperator, SelectorError> {
        match self.consume(Context::KeyAndOperator) {
            Token::In => Ok(LabelOperator::In),
            Token::NotIn => Ok(LabelOperator::NotIn),
            Token::Equals => Ok(LabelOperator::Equals),
            Token::DoubleEquals => Ok(LabelOperator::DoubleEquals),
            Token::NotEquals => Ok(LabelOperator::NotEquals),
            Token::GreaterThan => Ok(LabelOperator::GreaterThan),
            Token::LessThan => Ok(LabelOperator::LessThan),
            other => Err(unexpected(&other, "=, ==, !=, >, <, in, notin")),
        }
    }

    fn parse_values(&mut self) -> Result<Vec<String>, SelectorError> {
        let token = self.consume(Context::Values);
        if token != Token::OpenParen {
            return Err(unexpected(&token, "'('"));
        }

        match self.lookahead(Context::Values) {
            Token::Identifier(_) | Token::Comma => {
                let values = self.parse_identifier_list()?;
                match self.consume(Context::Values) {
                    Token::CloseParen => Ok(values),
                    other => Err(unexpected(&other, "')'")),
                }
            }
            Token::CloseParen => {
                self.consume(Context::Values);
                Ok(vec![String::new()])
            }
            other => Err(unexpected(&other, "',', ')' or identifier")),
        }
    }

    /// Values up to, not including, the closing parenthesis. Gaps between
    /// commas read as the empty value.
    fn parse_identifier_list(&mut self) -> Result<Vec<String>, SelectorError> {
        let mut values = BTreeSet::new();
        loop {
            match self.consume(Context::Values) {
                Token::Identifier(value) => {
                    values.insert(value);
                    match self.lookahead(Context::Values) {
                        Token::Comma => continue,
                        Token::CloseParen => return Ok(values.into_iter().collect()),
                        other => return Err(unexpected(&other, "',' or ')'")),
                    }
                }
                Token::Comma => {
                    if values.is_empty() {
                        values.insert(String::new());
                    }
                    match self.lookahead(Context::Values) {
                        Token::CloseParen => {
                            values.insert(String::new());
                            return Ok(values.into_iter().collect());
                        }
                        Token::Comma => {
                            self.consume(Context::Values);
                            values.insert(String::new());
                        }
                        _ => {}
                    }
                }
                other => return Err(unexpected(&other, "',', or identifier")),
            }
        }
    }

    fn parse_exact_value(&mut self) -> Result<Vec<String>, SelectorError> {
        if matches!(self.lookahead(Context::Values), Token::End | Token::Comma) {
            return Ok(vec![String::new()]);
        }
        match self.consume(Context::Values) {
            Token::Identifier(value) => Ok(vec![value]),
            other => Err(unexpected(&other, "identifier")),
        }
    }
}

fn unexpected(token: &Token, expected: &'static str) -> SelectorError {
    SelectorError::Unexpected {
        found: token.literal().to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::NameError;

    fn ops(selector: &str) -> Vec<LabelOperator> {
        parse_label_selector(selector)
            .unwrap()
            .requirements()
            .iter()
            .map(LabelRequirement::operator)
            .collect()
    }

    #[test]
    fn test_lexer() {
        assert_eq!(
            lex("a!=b,c in (d)"),
            vec![
                Token::Identifier("a".into()),
                Token::NotEquals,
                Token::Identifier("b".into()),
                Token::Comma,
                Token::Identifier("c".into()),
                Token::In,
                Token::OpenParen,
                Token::Identifier("d".into()),
                Token::CloseParen,
                Token::End,
            ]
        );
        assert_eq!(lex("  "), vec![Token::End]);
    }

    #[test]
    fn test_empty_selector() {
        assert!(parse_label_selector("").unwrap().is_empty());
        assert!(parse_label_selector("   ").unwrap().is_empty());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            ops("a,!b,c=1,d==2,e!=3,f in (x),g notin (y),h>4,i<5"),
            vec![
                LabelOperator::Exists,
                LabelOperator::DoesNotExist,
                LabelOperator::Equals,
                LabelOperator::DoubleEquals,
                LabelOperator::NotEquals,
                LabelOperator::In,
                LabelOperator::NotIn,
                LabelOperator::GreaterThan,
                LabelOperator::LessThan,
            ]
        );
    }

    #[test]
    fn test_set_values_sorted_and_deduplicated() {
        let selector = parse_label_selector("tier in (web, api, web)").unwrap();
        assert_eq!(selector.requirements()[0].values(), ["api", "web"]);
    }

    #[test]
    fn test_keywords_as_values() {
        let selector = parse_label_selector("mode in (in,notin)").unwrap();
        assert_eq!(selector.requirements()[0].values(), ["in", "notin"]);
    }

    #[test]
    fn test_empty_values() {
        let selector = parse_label_selector("env=").unwrap();
        assert_eq!(selector.requirements()[0].values(), [""]);

        let selector = parse_label_selector("env in (,prod)").unwrap();
        assert_eq!(selector.requirements()[0].values(), ["", "prod"]);
    }

    #[test]
    fn test_prefixed_keys() {
        let selector = parse_label_selector("app.kubernetes.io/name=web").unwrap();
        assert_eq!(selector.requirements()[0].key(), "app.kubernetes.io/name");
    }

    #[test]
    fn test_rejects_malformed() {
        for selector in [
            "env in prod",
            "env=prod,",
            ",env",
            "env in (prod",
            "env notin prod)",
            "replicas>two",
            "env=a=b",
            "=prod",
            "!",
            "env=pr od",
            "-env=prod",
            "env=prod-",
        ] {
            assert!(
                parse_label_selector(selector).is_err(),
                "{selector:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_error_messages() {
        let err = parse_label_selector("env=prod,").unwrap_err();
        assert_eq!(err.to_string(), "found '', expected: identifier after ','");

        let err = parse_label_selector("replicas>two").unwrap_err();
        assert_eq!(
            err.to_string(),
            "for 'Gt', 'Lt' operators, the value must be an integer: two"
        );
    }

    #[test]
    fn test_name_errors_carry_their_reason() {
        assert_eq!(
            parse_label_selector("Example.com/app=web"),
            Err(SelectorError::InvalidKey {
                key: "Example.com/app".to_string(),
                reason: NameError::InvalidPrefix,
            })
        );
        assert_eq!(
            parse_label_selector("env=prod-"),
            Err(SelectorError::InvalidValue {
                value: "prod-".to_string(),
                reason: NameError::InvalidValue,
            })
        );
    }

    #[test]
    fn test_display_round_trips_structure() {
        let text = "!canary,env=prod,tier notin (db)";
        let selector = parse_label_selector(text).unwrap();
        assert_eq!(selector.to_string(), text);
    }
}
