//! Condition rules attached to action permissions.
//!
//! A rule is `{field, operator, value}` and is tested against a caller
//! supplied record. The `current_user` sentinel in `value` is replaced by the
//! acting user's id before comparing.

use serde_json::Value;

use crate::error::{GuardError, GuardResult};
use crate::model::{ConditionRule, Operator, CURRENT_USER};
use crate::value::{lookup, to_text};

/// Parse a stored rule. `Ok(None)` means "no condition".
///
/// Accepts an object or a string holding a JSON object.
pub fn parse_rule(raw: &Value) -> GuardResult<Option<ConditionRule>> {
    let map = match raw {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => {
            let decoded: Value = serde_json::from_str(s)?;
            return match decoded {
                Value::String(_) => Err(GuardError::MalformedRule {
                    reason: "rule string does not contain an object".to_string(),
                }),
                other => parse_rule(&other),
            };
        }
        Value::Object(map) if map.is_empty() => return Ok(None),
        Value::Object(map) => map,
        other => {
            return Err(GuardError::MalformedRule {
                reason: format!("expected an object, found {}", other),
            })
        }
    };

    let field = match map.get("field") {
        Some(Value::String(f)) if !f.is_empty() => f.clone(),
        _ => {
            return Err(GuardError::MalformedRule {
                reason: "missing 'field'".to_string(),
            })
        }
    };
    let operator = match map.get("operator") {
        Some(Value::String(op)) => op.parse::<Operator>()?,
        _ => {
            return Err(GuardError::MalformedRule {
                reason: "missing 'operator'".to_string(),
            })
        }
    };
    let value = map.get("value").cloned().unwrap_or(Value::Null);

    Ok(Some(ConditionRule {
        field,
        operator,
        value,
    }))
}

/// Evaluate a stored rule for `user_id` against `record`.
///
/// No rule allows. A malformed rule or unknown operator is logged and denies.
pub fn evaluate_rule(raw: Option<&Value>, record: Option<&Value>, user_id: &str) -> bool {
    let Some(raw) = raw else {
        return true;
    };
    match parse_rule(raw) {
        Ok(None) => true,
        Ok(Some(rule)) => rule.evaluate(record, user_id),
        Err(err) => {
            tracing::warn!(error = %err, "rejecting condition rule");
            false
        }
    }
}

impl ConditionRule {
    /// Without a record (or with an empty one) the rule cannot hold.
    pub fn evaluate(&self, record: Option<&Value>, user_id: &str) -> bool {
        let record = match record {
            Some(Value::Object(map)) if !map.is_empty() => record,
            Some(Value::Object(_)) | Some(Value::Null) | None => {
                tracing::debug!(field = %self.field, "no record to evaluate condition against");
                return false;
            }
            other => other,
        };

        let actual = record
            .and_then(|r| lookup(r, &self.field))
            .filter(|v| !v.is_null());
        let expected = substitute_current_user(&self.value, user_id);

        match self.operator {
            Operator::Equals => actual.is_some_and(|a| to_text(a) == to_text(&expected)),
            Operator::NotEquals => actual.map_or(true, |a| to_text(a) != to_text(&expected)),
            Operator::In => {
                actual.is_some_and(|a| candidates(&expected, user_id).contains(&to_text(a)))
            }
            Operator::NotIn => {
                actual.map_or(true, |a| !candidates(&expected, user_id).contains(&to_text(a)))
            }
            Operator::GreaterThan | Operator::LessThan => {
                match (actual.and_then(as_number), as_number(&expected)) {
                    (Some(a), Some(b)) if self.operator == Operator::GreaterThan => a > b,
                    (Some(a), Some(b)) => a < b,
                    _ => {
                        tracing::warn!(
                            field = %self.field,
                            operator = %self.operator,
                            "non-numeric operand in numeric comparison"
                        );
                        false
                    }
                }
            }
            Operator::IsNull => actual.is_none(),
            Operator::IsNotNull => actual.is_some(),
        }
    }
}

fn substitute_current_user(value: &Value, user_id: &str) -> Value {
    match value {
        Value::String(s) if s == CURRENT_USER => Value::String(user_id.to_string()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_current_user(item, user_id))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Members of an `in`/`not_in` list: a JSON array, a string holding a JSON
/// array, or a comma-separated string.
fn candidates(expected: &Value, user_id: &str) -> Vec<String> {
    let items: Vec<String> = match expected {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(to_text).collect(),
        Value::String(s) if s.trim_start().starts_with('[') => {
            match serde_json::from_str::<Vec<Value>>(s) {
                Ok(items) => items.iter().map(to_text).collect(),
                Err(_) => split_list(s),
            }
        }
        Value::String(s) => split_list(s),
        other => vec![to_text(other)],
    };
    items
        .into_iter()
        .map(|item| {
            if item == CURRENT_USER {
                user_id.to_string()
            } else {
                item
            }
        })
        .collect()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|item| item.trim().to_string()).collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
