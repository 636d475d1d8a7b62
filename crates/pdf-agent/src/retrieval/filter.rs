//! Structured metadata filter language used by the self-query retriever
//!
//! The query constructor LLM writes filters as nested function calls:
//!
//! ```text
//! and(eq("document_type", "CV"), contain("author", "Smith"))
//! ```
//!
//! `NO_FILTER` means "no restriction". Parsed filters can be checked against
//! the metadata schema, translated to a Pinecone filter document, or
//! evaluated directly against chunk metadata.

use serde_json::{json, Number, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::types::ChunkMetadata;

/// Literal meaning "no filter"
pub const NO_FILTER: &str = "NO_FILTER";

/// Attribute comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contain,
    Like,
    In,
    Nin,
}

impl Comparator {
    pub const ALL: [Comparator; 10] = [
        Comparator::Eq,
        Comparator::Ne,
        Comparator::Gt,
        Comparator::Gte,
        Comparator::Lt,
        Comparator::Lte,
        Comparator::Contain,
        Comparator::Like,
        Comparator::In,
        Comparator::Nin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Ne => "ne",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
            Comparator::Contain => "contain",
            Comparator::Like => "like",
            Comparator::In => "in",
            Comparator::Nin => "nin",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// Logical combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    pub const ALL: [Operator; 3] = [Operator::And, Operator::Or, Operator::Not];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == name)
    }
}

/// The comparators and operators a vector store can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSupport {
    pub comparators: &'static [Comparator],
    pub operators: &'static [Operator],
}

impl FilterSupport {
    /// Everything the filter language can express
    pub const FULL: FilterSupport = FilterSupport {
        comparators: &Comparator::ALL,
        operators: &Operator::ALL,
    };

    /// Pinecone metadata filters: no substring matching, no negation
    pub const PINECONE: FilterSupport = FilterSupport {
        comparators: &[
            Comparator::Eq,
            Comparator::Ne,
            Comparator::Gt,
            Comparator::Gte,
            Comparator::Lt,
            Comparator::Lte,
            Comparator::In,
            Comparator::Nin,
        ],
        operators: &[Operator::And, Operator::Or],
    };

    /// Fail on the first comparator or operator outside this set
    pub fn check(&self, filter: &Filter) -> Result<()> {
        match filter {
            Filter::Comparison { comparator, .. } => {
                if self.comparators.contains(comparator) {
                    Ok(())
                } else {
                    Err(Error::Filter(format!(
                        "comparator '{}' is not allowed",
                        comparator.as_str()
                    )))
                }
            }
            Filter::Operation {
                operator,
                arguments,
            } => {
                if !self.operators.contains(operator) {
                    return Err(Error::Filter(format!(
                        "operator '{}' is not allowed",
                        operator.as_str()
                    )));
                }
                arguments.iter().try_for_each(|f| self.check(f))
            }
        }
    }
}

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Comparison {
        comparator: Comparator,
        attribute: String,
        value: Value,
    },
    Operation {
        operator: Operator,
        arguments: Vec<Filter>,
    },
}

impl Filter {
    /// Shorthand for an `eq` comparison
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Comparison {
            comparator: Comparator::Eq,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Parse a filter expression. `NO_FILTER` and blank input yield `None`.
    pub fn parse(input: &str) -> Result<Option<Filter>> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == NO_FILTER {
            return Ok(None);
        }

        let mut parser = Parser::new(trimmed);
        let filter = parser.filter()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(Some(filter))
    }

    /// Every attribute referenced must be in `attributes`
    pub fn validate(&self, attributes: &[&str]) -> Result<()> {
        match self::attributes(self)
            .into_iter()
            .find(|attribute| !attributes.contains(attribute))
        {
            Some(unknown) => Err(Error::Filter(format!(
                "unknown attribute '{}', expected one of {:?}",
                unknown, attributes
            ))),
            None => Ok(()),
        }
    }

    /// Translate to a Pinecone metadata filter.
    ///
    /// Pinecone has no substring matching and no negation operator, so
    /// `contain`, `like` and `not` are rejected.
    pub fn to_pinecone(&self) -> Result<Value> {
        match self {
            Filter::Comparison {
                comparator,
                attribute,
                value,
            } => {
                let op = match comparator {
                    Comparator::Eq => "$eq",
                    Comparator::Ne => "$ne",
                    Comparator::Gt => "$gt",
                    Comparator::Gte => "$gte",
                    Comparator::Lt => "$lt",
                    Comparator::Lte => "$lte",
                    Comparator::In => "$in",
                    Comparator::Nin => "$nin",
                    Comparator::Contain | Comparator::Like => {
                        return Err(Error::Filter(format!(
                            "comparator '{}' is not supported by Pinecone",
                            comparator.as_str()
                        )))
                    }
                };
                Ok(json!({ attribute.as_str(): { op: value } }))
            }
            Filter::Operation {
                operator,
                arguments,
            } => {
                let op = match operator {
                    Operator::And => "$and",
                    Operator::Or => "$or",
                    Operator::Not => {
                        return Err(Error::Filter(
                            "operator 'not' is not supported by Pinecone".to_string(),
                        ))
                    }
                };
                let translated = arguments
                    .iter()
                    .map(Filter::to_pinecone)
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({ op: translated }))
            }
        }
    }

    /// Evaluate against chunk metadata
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match self {
            Filter::Comparison {
                comparator,
                attribute,
                value,
            } => compare(*comparator, metadata.get(attribute).as_ref(), value),
            Filter::Operation {
                operator,
                arguments,
            } => match operator {
                Operator::And => arguments.iter().all(|f| f.matches(metadata)),
                Operator::Or => arguments.iter().any(|f| f.matches(metadata)),
                Operator::Not => !arguments.iter().all(|f| f.matches(metadata)),
            },
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Comparison {
                comparator,
                attribute,
                value,
            } => write!(f, "{}(\"{}\", {})", comparator.as_str(), attribute, value),
            Filter::Operation {
                operator,
                arguments,
            } => {
                write!(f, "{}(", operator.as_str())?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn compare(comparator: Comparator, actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        // absent attributes only satisfy negative comparisons
        return matches!(comparator, Comparator::Ne | Comparator::Nin);
    };

    match comparator {
        Comparator::Eq => values_equal(actual, expected),
        Comparator::Ne => !values_equal(actual, expected),
        Comparator::Gt => order(actual, expected) == Some(Ordering::Greater),
        Comparator::Gte => matches!(
            order(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Comparator::Lt => order(actual, expected) == Some(Ordering::Less),
        Comparator::Lte => matches!(
            order(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Comparator::Contain => match (actual, expected) {
            (Value::String(a), Value::String(e)) => a.contains(e.as_str()),
            (Value::Array(items), e) => items.iter().any(|item| values_equal(item, e)),
            _ => false,
        },
        Comparator::Like => match (actual, expected) {
            (Value::String(a), Value::String(e)) => {
                a.to_lowercase().contains(&e.trim_matches('%').to_lowercase())
            }
            _ => false,
        },
        Comparator::In => match expected {
            Value::Array(options) => options.iter().any(|o| values_equal(actual, o)),
            other => values_equal(actual, other),
        },
        Comparator::Nin => match expected {
            Value::Array(options) => !options.iter().any(|o| values_equal(actual, o)),
            other => !values_equal(actual, other),
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Recursive descent parser over the filter expression
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: &str) -> Error {
        Error::Filter(format!(
            "{} at position {} in '{}'",
            message, self.pos, self.input
        ))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", expected))),
        }
    }

    fn identifier(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn filter(&mut self) -> Result<Filter> {
        let name = self.identifier()?;
        self.expect('(')?;

        if let Some(comparator) = Comparator::parse(name) {
            let attribute = match self.value()? {
                Value::String(s) => s,
                _ => return Err(self.error("attribute name must be a string")),
            };
            self.expect(',')?;
            let value = self.value()?;
            self.expect(')')?;
            return Ok(Filter::Comparison {
                comparator,
                attribute,
                value,
            });
        }

        let operator =
            Operator::parse(name).ok_or_else(|| self.error(&format!("unknown function '{}'", name)))?;

        let mut arguments = vec![self.filter()?];
        loop {
            self.skip_whitespace();
            match self.bump() {
                Some(',') => arguments.push(self.filter()?),
                Some(')') => break,
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }

        if operator == Operator::Not && arguments.len() != 1 {
            return Err(self.error("'not' takes exactly one argument"));
        }

        Ok(Filter::Operation {
            operator,
            arguments,
        })
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.string(quote).map(Value::String)
            }
            Some('[') => {
                self.bump();
                let mut items = Vec::new();
                self.skip_whitespace();
                if self.peek() == Some(']') {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                loop {
                    items.push(self.value()?);
                    self.skip_whitespace();
                    match self.bump() {
                        Some(',') => continue,
                        Some(']') => return Ok(Value::Array(items)),
                        _ => return Err(self.error("expected ',' or ']'")),
                    }
                }
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => match self.identifier()? {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(self.error(&format!("unexpected token '{}'", other))),
            },
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c == '-' || c == '.' || c == 'e' || c == 'E' || c.is_ascii_digit())
        {
            self.bump();
        }
        let text = &self.input[start..self.pos];

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(&format!("invalid number '{}'", text)))
    }
}

/// Collect the comparison attributes of a filter, in order of appearance
pub fn attributes(filter: &Filter) -> Vec<&str> {
    let mut out = Vec::new();
    collect_attributes(filter, &mut out);
    out
}

fn collect_attributes<'f>(filter: &'f Filter, out: &mut Vec<&'f str>) {
    match filter {
        Filter::Comparison { attribute, .. } => out.push(attribute),
        Filter::Operation { arguments, .. } => {
            for arg in arguments {
                collect_attributes(arg, out);
            }
        }
    }
}

/// Render an optional filter for logs
pub fn describe(filter: Option<&Filter>) -> String {
    filter
        .map(|f| f.to_string())
        .unwrap_or_else(|| NO_FILTER.to_string())
}
