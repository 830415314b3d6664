//! Authorization: field-level access and action-level checks.
//!
//! Every check here is fail-closed. Lookups that miss and rules that cannot be
//! evaluated resolve to "deny" and are logged, never returned as errors.

pub mod actions;
pub mod condition;
pub mod fields;

pub use actions::ActionEvaluator;
pub use condition::{evaluate_rule, parse_rule};
pub use fields::FieldResolver;
