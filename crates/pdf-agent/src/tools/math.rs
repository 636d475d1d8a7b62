//! Arithmetic tools for the maths agent

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::agent::Tool;
use crate::error::{Error, Result};

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

fn number_pattern() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| {
        Regex::new(r"-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?").expect("Invalid regex")
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read two operands from the action input.
///
/// Accepts `{"a": 17, "b": 4}`, `[17, 4]`, or text containing exactly two
/// numbers such as `17, 4` or `17 and 4`.
pub fn parse_operands(tool: &str, input: &str) -> Result<(f64, f64)> {
    let invalid = || {
        Error::tool(
            tool,
            format!("expected two numbers, e.g. {{\"a\": 1, \"b\": 2}}; got `{}`", input),
        )
    };

    match serde_json::from_str::<Value>(input.trim()) {
        Ok(Value::Object(map)) => {
            let a = map.get("a").and_then(as_number).ok_or_else(invalid)?;
            let b = map.get("b").and_then(as_number).ok_or_else(invalid)?;
            Ok((a, b))
        }
        Ok(Value::Array(items)) if items.len() == 2 => {
            let a = as_number(&items[0]).ok_or_else(invalid)?;
            let b = as_number(&items[1]).ok_or_else(invalid)?;
            Ok((a, b))
        }
        _ => {
            let numbers: Vec<f64> = number_pattern()
                .find_iter(input)
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            match numbers.as_slice() {
                [a, b] => Ok((*a, *b)),
                _ => Err(invalid()),
            }
        }
    }
}

/// `add(a, b)`
pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers a and b. Input: {\"a\": number, \"b\": number}"
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let (a, b) = parse_operands(self.name(), input)?;
        Ok(add(a, b).to_string())
    }
}

/// `multiply(a, b)`
pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers a and b. Input: {\"a\": number, \"b\": number}"
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let (a, b) = parse_operands(self.name(), input)?;
        Ok(multiply(a, b).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(multiply(17.0, 4.0), 68.0);
        assert_eq!(add(0.5, 0.25), 0.75);
        assert!(multiply(f64::MAX, 2.0).is_infinite());
    }

    #[test]
    fn test_operand_formats() {
        assert_eq!(parse_operands("t", r#"{"a": 17, "b": 4}"#).unwrap(), (17.0, 4.0));
        assert_eq!(parse_operands("t", r#"{"a": "2.5", "b": -1}"#).unwrap(), (2.5, -1.0));
        assert_eq!(parse_operands("t", "[17, 4]").unwrap(), (17.0, 4.0));
        assert_eq!(parse_operands("t", "17, 4").unwrap(), (17.0, 4.0));
        assert_eq!(parse_operands("t", "a=17 b=4").unwrap(), (17.0, 4.0));
    }

    #[test]
    fn test_operand_errors() {
        let err = parse_operands("multiply", "17").unwrap_err();
        assert!(matches!(err, Error::Tool { ref tool, .. } if tool == "multiply"));
        assert!(parse_operands("add", "1 2 3").is_err());
        assert!(parse_operands("add", r#"{"a": 1}"#).is_err());
    }

    #[tokio::test]
    async fn test_tools_invoke() {
        assert_eq!(MultiplyTool.invoke("17, 4").await.unwrap(), "68");
        assert_eq!(AddTool.invoke(r#"{"a": 1.5, "b": 2}"#).await.unwrap(), "3.5");
    }
}
