//! `{{#if ...}}` expressions.
//!
//! Exactly one of `field == 'literal'`, `field != 'literal'` or a bare
//! `field` (truthy test). There is no boolean composition.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::value::resolve;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals { path: String, literal: String },
    NotEquals { path: String, literal: String },
    Truthy { path: String },
    /// Unparsable expression; always false.
    Invalid(String),
}

impl Condition {
    pub fn parse(expr: &str) -> Self {
        static COMPARISON_REGEX: OnceLock<Regex> = OnceLock::new();
        static PATH_REGEX: OnceLock<Regex> = OnceLock::new();

        let comparison = COMPARISON_REGEX.get_or_init(|| {
            Regex::new(r"^([^\s=!'{}]+)\s*(==|!=)\s*'([^']*)'$").unwrap()
        });
        let path = PATH_REGEX.get_or_init(|| Regex::new(r"^[^\s=!'{}]+$").unwrap());

        let expr = expr.trim();
        if let Some(caps) = comparison.captures(expr) {
            let path = caps[1].to_string();
            let literal = caps[3].to_string();
            return if &caps[2] == "==" {
                Condition::Equals { path, literal }
            } else {
                Condition::NotEquals { path, literal }
            };
        }
        if path.is_match(expr) {
            return Condition::Truthy {
                path: expr.to_string(),
            };
        }
        Condition::Invalid(expr.to_string())
    }

    pub fn evaluate(&self, data: &Value) -> bool {
        match self {
            Condition::Equals { path, literal } => resolve(data, path) == *literal,
            Condition::NotEquals { path, literal } => resolve(data, path) != *literal,
            Condition::Truthy { path } => is_truthy(&resolve(data, path)),
            Condition::Invalid(expr) => {
                tracing::warn!(expr = %expr, "unsupported #if expression, treating as false");
                false
            }
        }
    }
}

/// Non-empty and not the literal text `false`.
pub fn is_truthy(text: &str) -> bool {
    !text.is_empty() && text != "false"
}

/// Parse and evaluate `expr` against `data` in one step.
pub fn evaluate_condition(expr: &str, data: &Value) -> bool {
    Condition::parse(expr).evaluate(data)
}
