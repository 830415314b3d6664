//! Permission and metadata records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::GuardError;
use crate::view::ViewType;

/// Role name that bypasses every action check.
pub const ADMIN_ROLE: &str = "admin";

/// Condition value replaced by the acting user's id before comparison.
pub const CURRENT_USER: &str = "current_user";

/// A field declared on an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub entity: String,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_entity: Option<String>,
}

fn default_data_type() -> String {
    "text".to_string()
}

/// Role and activity flag of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub role: String,
    pub is_active: bool,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Per-role flags for one field. There is no `form_view_editable`: view mode
/// is never editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    pub role: String,
    pub entity: String,
    pub field: String,
    #[serde(default = "list_visible")]
    pub list_visible: bool,
    #[serde(default = "list_editable")]
    pub list_editable: bool,
    #[serde(default = "form_create_visible")]
    pub form_create_visible: bool,
    #[serde(default = "form_create_editable")]
    pub form_create_editable: bool,
    #[serde(default = "form_edit_visible")]
    pub form_edit_visible: bool,
    #[serde(default = "form_edit_editable")]
    pub form_edit_editable: bool,
    #[serde(default = "form_view_visible")]
    pub form_view_visible: bool,
}

fn list_visible() -> bool {
    ViewType::List.defaults().visible
}
fn list_editable() -> bool {
    ViewType::List.defaults().editable
}
fn form_create_visible() -> bool {
    ViewType::FormCreate.defaults().visible
}
fn form_create_editable() -> bool {
    ViewType::FormCreate.defaults().editable
}
fn form_edit_visible() -> bool {
    ViewType::FormEdit.defaults().visible
}
fn form_edit_editable() -> bool {
    ViewType::FormEdit.defaults().editable
}
fn form_view_visible() -> bool {
    ViewType::FormView.defaults().visible
}

impl FieldPermission {
    /// A row carrying the default policy for every view.
    pub fn with_defaults(role: &str, entity: &str, field: &str) -> Self {
        Self {
            role: role.to_string(),
            entity: entity.to_string(),
            field: field.to_string(),
            list_visible: list_visible(),
            list_editable: list_editable(),
            form_create_visible: form_create_visible(),
            form_create_editable: form_create_editable(),
            form_edit_visible: form_edit_visible(),
            form_edit_editable: form_edit_editable(),
            form_view_visible: form_view_visible(),
        }
    }

    pub fn visible_in(&self, view: ViewType) -> bool {
        match view {
            ViewType::List => self.list_visible,
            ViewType::FormCreate => self.form_create_visible,
            ViewType::FormEdit => self.form_edit_visible,
            ViewType::FormView => self.form_view_visible,
        }
    }

    pub fn editable_in(&self, view: ViewType) -> bool {
        match view {
            ViewType::List => self.list_editable,
            ViewType::FormCreate => self.form_create_editable,
            ViewType::FormEdit => self.form_edit_editable,
            ViewType::FormView => false,
        }
    }
}

/// Whether a role may perform an action on an entity.
///
/// `condition_rule` is kept unparsed so that a malformed rule denies at
/// evaluation time instead of rejecting the whole configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPermission {
    pub role: String,
    pub entity: String,
    pub action: String,
    pub is_allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_rule: Option<Value>,
}

impl ActionPermission {
    /// `null`, `{}` and blank strings count as "no condition".
    pub fn has_condition(&self) -> bool {
        match &self.condition_rule {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }
}

/// Comparison operators allowed in a [`ConditionRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Operator::Equals),
            "not_equals" => Ok(Operator::NotEquals),
            "in" => Ok(Operator::In),
            "not_in" => Ok(Operator::NotIn),
            "greater_than" => Ok(Operator::GreaterThan),
            "less_than" => Ok(Operator::LessThan),
            "is_null" => Ok(Operator::IsNull),
            "is_not_null" => Ok(Operator::IsNotNull),
            other => Err(GuardError::UnknownOperator {
                operator: other.to_string(),
            }),
        }
    }
}

/// `{field, operator, value}` tested against a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRule {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// Resolved access for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldAccess {
    pub field: String,
    pub visible: bool,
    pub editable: bool,
}

/// One mapped action and its stored flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionAccess {
    pub action: String,
    pub allowed: bool,
    pub has_condition: bool,
}

/// Outcome of a batch action check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCheck {
    pub action: String,
    pub allowed: bool,
}

/// Visible and editable field names for one (user, entity, view).
///
/// Built fresh per request. The sets are independent: a field may be listed as
/// editable without being visible, and visibility wins.
///
/// `defined` holds every field of the entity when the snapshot was resolved
/// from field definitions. Markup references outside it (line-item columns,
/// lookup labels) are then left alone. Without it every referenced field is
/// governed by the two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSnapshot {
    pub visible: BTreeSet<String>,
    pub editable: BTreeSet<String>,
    pub defined: Option<BTreeSet<String>>,
}

impl PermissionSnapshot {
    pub fn new<V, E>(visible: V, editable: E) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            visible: visible.into_iter().map(Into::into).collect(),
            editable: editable.into_iter().map(Into::into).collect(),
            defined: None,
        }
    }

    pub fn from_access(access: &[FieldAccess]) -> Self {
        Self {
            visible: access
                .iter()
                .filter(|a| a.visible)
                .map(|a| a.field.clone())
                .collect(),
            editable: access
                .iter()
                .filter(|a| a.editable)
                .map(|a| a.field.clone())
                .collect(),
            defined: Some(access.iter().map(|a| a.field.clone()).collect()),
        }
    }

    /// A dotted path such as `supplier.name` is visible when the path itself
    /// or its first segment is.
    pub fn is_visible(&self, field: &str) -> bool {
        covers(&self.visible, field)
    }

    pub fn is_editable(&self, field: &str) -> bool {
        covers(&self.editable, field)
    }

    /// Whether the snapshot decides access for `field`.
    pub fn governs(&self, field: &str) -> bool {
        self.defined.as_ref().map_or(true, |defined| covers(defined, field))
    }
}

/// First segment of a dotted path: the entity field it reads from.
pub fn field_root(path: &str) -> &str {
    path.split_once('.').map_or(path, |(root, _)| root)
}

fn covers(fields: &BTreeSet<String>, path: &str) -> bool {
    fields.contains(path) || fields.contains(field_root(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_flags_take_view_defaults() {
        let row: FieldPermission =
            serde_yaml::from_str("role: viewer\nentity: po\nfield: notes\nlist_visible: false\n")
                .unwrap();
        assert!(!row.visible_in(ViewType::List));
        assert!(row.visible_in(ViewType::FormEdit));
        assert!(!row.editable_in(ViewType::List));
        assert!(row.editable_in(ViewType::FormCreate));
        assert_eq!(
            FieldPermission {
                list_visible: true,
                ..row
            },
            FieldPermission::with_defaults("viewer", "po", "notes")
        );
    }

    #[test]
    fn view_mode_is_never_editable() {
        let mut row = FieldPermission::with_defaults("r", "e", "f");
        row.form_edit_editable = true;
        assert!(!row.editable_in(ViewType::FormView));
    }

    #[test]
    fn operator_names_round_trip() {
        for name in ["equals", "not_in", "greater_than", "is_not_null"] {
            assert_eq!(name.parse::<Operator>().unwrap().as_str(), name);
        }
        assert!("matches".parse::<Operator>().is_err());
    }

    #[test]
    fn empty_conditions_are_not_conditions() {
        let mut perm = ActionPermission {
            role: "clerk".into(),
            entity: "po".into(),
            action: "edit".into(),
            is_allowed: true,
            condition_rule: None,
        };
        assert!(!perm.has_condition());
        perm.condition_rule = Some(json!({}));
        assert!(!perm.has_condition());
        perm.condition_rule = Some(json!(""));
        assert!(!perm.has_condition());
        perm.condition_rule = Some(json!({"field": "status", "operator": "equals", "value": "draft"}));
        assert!(perm.has_condition());
    }

    #[test]
    fn snapshot_from_access() {
        let snap = PermissionSnapshot::from_access(&[
            FieldAccess { field: "a".into(), visible: true, editable: false },
            FieldAccess { field: "b".into(), visible: false, editable: true },
        ]);
        assert!(snap.is_visible("a"));
        assert!(!snap.is_editable("a"));
        assert!(!snap.is_visible("b"));
        assert!(snap.is_editable("b"));
        assert!(snap.governs("b"));
        assert!(!snap.governs("c"));
        assert!(PermissionSnapshot::new(["a"], Vec::<String>::new()).governs("c"));
    }

    #[test]
    fn nested_paths_follow_their_root_field() {
        let snap = PermissionSnapshot::from_access(&[
            FieldAccess { field: "supplier".into(), visible: false, editable: false },
            FieldAccess { field: "buyer".into(), visible: true, editable: false },
        ]);
        assert_eq!(field_root("supplier.address.city"), "supplier");
        assert_eq!(field_root("supplier"), "supplier");
        assert!(snap.governs("supplier.name"));
        assert!(!snap.is_visible("supplier.name"));
        assert!(snap.is_visible("buyer.email"));
        assert!(!snap.is_editable("buyer.email"));
        assert!(!snap.governs("vendor.name"));
    }
}
