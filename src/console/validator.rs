//! Turns operator text into typed values.
//!
//! This is the only place the console re-prompts: malformed or out-of-range
//! input is reported to the operator and asked for again, so nothing past the
//! validator ever sees an input error.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use super::error::{ConsoleError, ValidationError};
use super::operator::Operator;

/// What kind of value a prompt expects.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// An integer that must be one of the listed options.
    IntegerFromSet(BTreeSet<i64>),
    Float,
    /// Free-form text, passed through untouched.
    Text,
}

/// A validated operator value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "an integer",
            Value::Float(_) => "a number",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Validates a single line of operator text against `kind`.
pub fn validate(text: &str, kind: &ValueKind) -> Result<Value, ValidationError> {
    match kind {
        ValueKind::IntegerFromSet(allowed) => {
            let value: i64 = text
                .trim()
                .parse()
                .map_err(|_| ValidationError::NotANumber(text.to_string()))?;

            if allowed.contains(&value) {
                Ok(Value::Integer(value))
            } else {
                Err(ValidationError::NotInSet {
                    value,
                    allowed: allowed.iter().copied().collect(),
                })
            }
        }
        ValueKind::Float => {
            // `str::parse` accepts "nan" and "inf", which no channel can carry
            match text.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Value::Float(value)),
                _ => Err(ValidationError::NotANumber(text.to_string())),
            }
        }
        ValueKind::Text => Ok(Value::Text(text.to_string())),
    }
}

/// Prompts until the operator supplies text that validates against `kind`.
///
/// Only operator I/O failures (including closed input) escape this loop.
pub async fn prompt_until_valid<O: Operator + ?Sized>(
    operator: &mut O,
    prompt: &str,
    kind: &ValueKind,
) -> Result<Value, ConsoleError> {
    loop {
        let text = operator.read_line(prompt).await?;
        match validate(&text, kind) {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("Rejected operator input {:?}: {}", text, e);
                operator.show(&e.to_string()).await?;
            }
        }
    }
}
