//! Collaborator interfaces and a YAML-configured in-memory implementation.
//!
//! The engine only ever reads from these stores. Implement the traits over a
//! database to plug the engine into a real application; [`MemoryStore`] backs
//! the command-line tool and the tests.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::GuardResult;
use crate::model::{ActionPermission, FieldDefinition, FieldPermission, UserRole};
use crate::view::ViewType;

/// Entity field metadata.
pub trait FieldCatalog {
    /// Fields of `entity`, in display order.
    fn fields_of(&self, entity: &str) -> Vec<FieldDefinition>;
}

/// User to role mapping.
pub trait UserDirectory {
    /// `None` for unknown users.
    fn role_of(&self, user_id: &str) -> Option<UserRole>;
}

/// Stored field and action permission rows.
pub trait PermissionStore {
    fn field_permission(&self, role: &str, entity: &str, field: &str) -> Option<FieldPermission>;

    fn action_permission(&self, role: &str, entity: &str, action: &str)
        -> Option<ActionPermission>;

    /// Every action row for `role` on `entity`.
    fn action_permissions(&self, role: &str, entity: &str) -> Vec<ActionPermission>;

    /// Distinct action names mapped for `entity` across all roles.
    fn entity_actions(&self, entity: &str) -> Vec<String>;
}

/// Source of the active template per (entity, view).
pub trait TemplateStore {
    fn active_template(&self, entity: &str, view: ViewType) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub role: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub entity: String,
    pub view: ViewType,
    pub body: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

/// All configuration in memory, loadable from YAML:
///
/// ```yaml
/// users:
///   - { id: "u1", role: viewer }
/// fields:
///   - { entity: purchase_order, name: po_number, label: "PO #", order: 1 }
/// field_permissions:
///   - { role: viewer, entity: purchase_order, field: notes, list_visible: false }
/// action_permissions:
///   - role: clerk
///     entity: purchase_order
///     action: edit
///     is_allowed: true
///     condition_rule: { field: created_by, operator: equals, value: current_user }
/// templates:
///   - { entity: purchase_order, view: list, body: "<table>...</table>" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub field_permissions: Vec<FieldPermission>,
    #[serde(default)]
    pub action_permissions: Vec<ActionPermission>,
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> GuardResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> GuardResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn with_user(mut self, id: &str, role: &str, active: bool) -> Self {
        self.users.push(UserRecord {
            id: id.to_string(),
            role: role.to_string(),
            active,
        });
        self
    }

    pub fn with_field(mut self, entity: &str, name: &str) -> Self {
        let order = self.fields.iter().filter(|f| f.entity == entity).count() as i32;
        self.fields.push(FieldDefinition {
            entity: entity.to_string(),
            name: name.to_string(),
            label: name.to_string(),
            data_type: "text".to_string(),
            order,
            required: false,
            lookup_entity: None,
        });
        self
    }

    pub fn with_field_permission(mut self, permission: FieldPermission) -> Self {
        self.field_permissions.push(permission);
        self
    }

    pub fn with_action_permission(mut self, permission: ActionPermission) -> Self {
        self.action_permissions.push(permission);
        self
    }

    pub fn with_template(mut self, entity: &str, view: ViewType, body: &str) -> Self {
        self.templates.push(TemplateRecord {
            entity: entity.to_string(),
            view,
            body: body.to_string(),
            active: true,
        });
        self
    }
}

impl FieldCatalog for MemoryStore {
    fn fields_of(&self, entity: &str) -> Vec<FieldDefinition> {
        let mut fields: Vec<FieldDefinition> = self
            .fields
            .iter()
            .filter(|f| f.entity == entity)
            .cloned()
            .collect();
        // stable: equal orders keep declaration order
        fields.sort_by_key(|f| f.order);
        fields
    }
}

impl UserDirectory for MemoryStore {
    fn role_of(&self, user_id: &str) -> Option<UserRole> {
        self.users.iter().find(|u| u.id == user_id).map(|u| UserRole {
            role: u.role.clone(),
            is_active: u.active,
        })
    }
}

impl PermissionStore for MemoryStore {
    fn field_permission(&self, role: &str, entity: &str, field: &str) -> Option<FieldPermission> {
        self.field_permissions
            .iter()
            .find(|p| p.role == role && p.entity == entity && p.field == field)
            .cloned()
    }

    fn action_permission(
        &self,
        role: &str,
        entity: &str,
        action: &str,
    ) -> Option<ActionPermission> {
        self.action_permissions
            .iter()
            .find(|p| p.role == role && p.entity == entity && p.action == action)
            .cloned()
    }

    fn action_permissions(&self, role: &str, entity: &str) -> Vec<ActionPermission> {
        self.action_permissions
            .iter()
            .filter(|p| p.role == role && p.entity == entity)
            .cloned()
            .collect()
    }

    fn entity_actions(&self, entity: &str) -> Vec<String> {
        let mut actions: Vec<String> = Vec::new();
        for perm in self.action_permissions.iter().filter(|p| p.entity == entity) {
            if !actions.contains(&perm.action) {
                actions.push(perm.action.clone());
            }
        }
        actions
    }
}

impl TemplateStore for MemoryStore {
    fn active_template(&self, entity: &str, view: ViewType) -> Option<String> {
        self.templates
            .iter()
            .rev()
            .find(|t| t.active && t.entity == entity && t.view == view)
            .map(|t| t.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
users:
  - { id: "1", role: clerk }
  - { id: "2", role: clerk, active: false }
fields:
  - { entity: po, name: total, order: 2 }
  - { entity: po, name: number, order: 1 }
  - { entity: invoice, name: amount }
action_permissions:
  - { role: clerk, entity: po, action: create, is_allowed: true }
  - { role: viewer, entity: po, action: export, is_allowed: false }
  - { role: viewer, entity: po, action: create, is_allowed: false }
templates:
  - { entity: po, view: list, body: "old", active: false }
  - { entity: po, view: list, body: "v1" }
  - { entity: po, view: list, body: "v2" }
"#;

    #[test]
    fn loads_yaml_configuration() {
        let store = MemoryStore::from_yaml(YAML).unwrap();
        assert_eq!(store.users.len(), 2);
        assert_eq!(
            store.role_of("2"),
            Some(UserRole {
                role: "clerk".into(),
                is_active: false
            })
        );
        assert_eq!(store.role_of("9"), None);
    }

    #[test]
    fn fields_come_back_in_order() {
        let store = MemoryStore::from_yaml(YAML).unwrap();
        let names: Vec<String> = store.fields_of("po").into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["number", "total"]);
        assert!(store.fields_of("unknown").is_empty());
    }

    #[test]
    fn entity_actions_are_distinct() {
        let store = MemoryStore::from_yaml(YAML).unwrap();
        assert_eq!(store.entity_actions("po"), vec!["create", "export"]);
        assert_eq!(store.action_permissions("viewer", "po").len(), 2);
    }

    #[test]
    fn last_active_template_wins() {
        let store = MemoryStore::from_yaml(YAML).unwrap();
        assert_eq!(store.active_template("po", ViewType::List).as_deref(), Some("v2"));
        assert_eq!(store.active_template("po", ViewType::FormEdit), None);
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let err = MemoryStore::from_yaml("users: [ {id: 1").unwrap_err();
        assert!(matches!(err, crate::error::GuardError::Config(_)));
    }
}
