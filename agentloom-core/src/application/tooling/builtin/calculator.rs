//! Left-to-right arithmetic over a flat token stream. No precedence, no
//! parentheses: `2 + 3 * 4` is `(2 + 3) * 4`.

use crate::application::tooling::{ParamType, ToolDescriptor, ToolExecutionError, ToolHandler};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

pub const NAME: &str = "calculator";

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*|\+|-|\*|/|÷|x|X").expect("valid token pattern"));

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "Perform basic arithmetic calculations like '2 + 3 * 4' (evaluated left to right).",
    )
    .with_required(
        "expression",
        ParamType::String,
        "The arithmetic expression to evaluate.",
    )
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("invalid expression '{0}'")]
    InvalidExpression(String),
    #[error("incomplete expression '{0}': an operator is missing its operand")]
    IncompleteExpression(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" | "x" | "X" => Some(Operator::Multiply),
            "/" | "÷" => Some(Operator::Divide),
            _ => None,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Result<f64, CalculatorError> {
        match self {
            Operator::Add => Ok(lhs + rhs),
            Operator::Subtract => Ok(lhs - rhs),
            Operator::Multiply => Ok(lhs * rhs),
            Operator::Divide if rhs == 0.0 => Err(CalculatorError::DivisionByZero),
            Operator::Divide => Ok(lhs / rhs),
        }
    }
}

fn operand(token: &str) -> Result<f64, CalculatorError> {
    token
        .parse::<f64>()
        .map_err(|_| CalculatorError::InvalidNumber(token.to_string()))
}

pub fn evaluate(expression: &str) -> Result<f64, CalculatorError> {
    let tokens: Vec<&str> = TOKEN_PATTERN
        .find_iter(expression)
        .map(|found| found.as_str())
        .collect();
    let mut tokens = tokens.into_iter();

    let first = tokens
        .next()
        .ok_or_else(|| CalculatorError::InvalidExpression(expression.to_string()))?;
    let mut total = operand(first)?;

    while let Some(token) = tokens.next() {
        let operator = Operator::from_token(token)
            .ok_or_else(|| CalculatorError::InvalidExpression(expression.to_string()))?;
        let rhs = tokens
            .next()
            .ok_or_else(|| CalculatorError::IncompleteExpression(expression.to_string()))?;
        total = operator.apply(total, operand(rhs)?)?;
    }

    Ok(total)
}

#[derive(Debug)]
pub struct CalculatorTool {
    descriptor: ToolDescriptor,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self {
            descriptor: descriptor(),
        }
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for CalculatorTool {
    async fn call(&self, input: Value) -> Result<String, ToolExecutionError> {
        let args = self.descriptor.validate(&input)?;
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(evaluate(expression)?.to_string())
    }
}
