use serde_json::Value;

use crate::model::{ActionAccess, ActionCheck, UserRole};
use crate::permission::condition::evaluate_rule;
use crate::store::{PermissionStore, UserDirectory};

/// Decides whether a user may perform an action on an entity.
///
/// Order of checks:
/// 1. unknown or inactive user: deny
/// 2. `admin` role: allow
/// 3. no row for (role, entity, action): deny
/// 4. `is_allowed == false`: deny
/// 5. no condition: allow
/// 6. otherwise the condition decides
pub struct ActionEvaluator<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> ActionEvaluator<'s, S>
where
    S: UserDirectory + PermissionStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    fn active_role(&self, user_id: &str) -> Option<UserRole> {
        match self.store.role_of(user_id) {
            Some(role) if role.is_active => Some(role),
            Some(_) => {
                tracing::debug!(user = %user_id, "user is inactive");
                None
            }
            None => {
                tracing::debug!(user = %user_id, "unknown user");
                None
            }
        }
    }

    pub fn can_perform_action(
        &self,
        user_id: &str,
        entity: &str,
        action: &str,
        record: Option<&Value>,
    ) -> bool {
        let Some(role) = self.active_role(user_id) else {
            return false;
        };

        if role.is_admin() {
            tracing::debug!(user = %user_id, entity, action, "admin bypass");
            return true;
        }

        let Some(permission) = self.store.action_permission(&role.role, entity, action) else {
            tracing::debug!(role = %role.role, entity, action, "no action permission row, denying");
            return false;
        };

        if !permission.is_allowed {
            tracing::debug!(role = %role.role, entity, action, "action explicitly denied");
            return false;
        }

        let allowed = evaluate_rule(permission.condition_rule.as_ref(), record, user_id);
        if !allowed {
            tracing::debug!(role = %role.role, entity, action, "condition not satisfied");
        }
        allowed
    }

    /// Every action mapped for the user's role with its stored flag, ignoring
    /// conditions. Admins get every action mapped for the entity, allowed.
    /// Unknown and inactive users get nothing.
    pub fn actions_for(&self, user_id: &str, entity: &str) -> Vec<ActionAccess> {
        let Some(role) = self.active_role(user_id) else {
            return Vec::new();
        };

        if role.is_admin() {
            return self
                .store
                .entity_actions(entity)
                .into_iter()
                .map(|action| ActionAccess {
                    action,
                    allowed: true,
                    has_condition: false,
                })
                .collect();
        }

        self.store
            .action_permissions(&role.role, entity)
            .into_iter()
            .map(|p| ActionAccess {
                allowed: p.is_allowed,
                has_condition: p.has_condition(),
                action: p.action,
            })
            .collect()
    }

    pub fn allowed_actions(&self, user_id: &str, entity: &str) -> Vec<String> {
        self.actions_for(user_id, entity)
            .into_iter()
            .filter(|a| a.allowed)
            .map(|a| a.action)
            .collect()
    }

    /// Check each action without a record, so conditioned actions deny.
    pub fn check_actions<A: AsRef<str>>(
        &self,
        user_id: &str,
        entity: &str,
        actions: &[A],
    ) -> Vec<ActionCheck> {
        actions
            .iter()
            .map(|action| ActionCheck {
                action: action.as_ref().to_string(),
                allowed: self.can_perform_action(user_id, entity, action.as_ref(), None),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionPermission;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn action(role: &str, action: &str, allowed: bool, rule: Option<Value>) -> ActionPermission {
        ActionPermission {
            role: role.into(),
            entity: "purchase_order".into(),
            action: action.into(),
            is_allowed: allowed,
            condition_rule: rule,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_user("root", "admin", true)
            .with_user("old-admin", "admin", false)
            .with_user("c1", "clerk", true)
            .with_user("c2", "clerk", false)
            .with_action_permission(action("clerk", "create", true, None))
            .with_action_permission(action("clerk", "delete", false, None))
            .with_action_permission(action(
                "clerk",
                "edit",
                true,
                Some(json!({"field": "created_by", "operator": "equals", "value": "current_user"})),
            ))
            .with_action_permission(action("manager", "approve", true, None))
    }

    #[test]
    fn admin_bypasses_everything() {
        let store = MemoryStore::new().with_user("root", "admin", true);
        let eval = ActionEvaluator::new(&store);
        assert!(eval.can_perform_action("root", "anything", "whatever", None));
    }

    #[test]
    fn inactive_and_unknown_users_are_denied() {
        let store = store();
        let eval = ActionEvaluator::new(&store);
        assert!(!eval.can_perform_action("old-admin", "purchase_order", "create", None));
        assert!(!eval.can_perform_action("c2", "purchase_order", "create", None));
        assert!(!eval.can_perform_action("ghost", "purchase_order", "create", None));
    }

    #[test]
    fn unmapped_and_denied_actions() {
        let store = store();
        let eval = ActionEvaluator::new(&store);
        assert!(eval.can_perform_action("c1", "purchase_order", "create", None));
        assert!(!eval.can_perform_action("c1", "purchase_order", "delete", None));
        assert!(!eval.can_perform_action("c1", "purchase_order", "unmapped_action", None));
        assert!(!eval.can_perform_action("c1", "invoice", "create", None));
    }

    #[test]
    fn conditions_use_the_record() {
        let store = store();
        let eval = ActionEvaluator::new(&store);
        let own = json!({"created_by": "c1"});
        let other = json!({"created_by": "c9"});
        assert!(eval.can_perform_action("c1", "purchase_order", "edit", Some(&own)));
        assert!(!eval.can_perform_action("c1", "purchase_order", "edit", Some(&other)));
        assert!(!eval.can_perform_action("c1", "purchase_order", "edit", None));
    }

    #[test]
    fn lists_actions_for_role() {
        let store = store();
        let eval = ActionEvaluator::new(&store);
        assert_eq!(
            eval.actions_for("c1", "purchase_order"),
            vec![
                ActionAccess { action: "create".into(), allowed: true, has_condition: false },
                ActionAccess { action: "delete".into(), allowed: false, has_condition: false },
                ActionAccess { action: "edit".into(), allowed: true, has_condition: true },
            ]
        );
        assert_eq!(eval.allowed_actions("c1", "purchase_order"), vec!["create", "edit"]);
        assert!(eval.actions_for("c2", "purchase_order").is_empty());
    }

    #[test]
    fn admin_lists_every_mapped_action() {
        let store = store();
        let eval = ActionEvaluator::new(&store);
        assert_eq!(
            eval.allowed_actions("root", "purchase_order"),
            vec!["create", "delete", "edit", "approve"]
        );
    }

    #[test]
    fn batch_check_has_no_record_context() {
        let store = store();
        let eval = ActionEvaluator::new(&store);
        assert_eq!(
            eval.check_actions("c1", "purchase_order", &["create", "edit", "approve"]),
            vec![
                ActionCheck { action: "create".into(), allowed: true },
                ActionCheck { action: "edit".into(), allowed: false },
                ActionCheck { action: "approve".into(), allowed: false },
            ]
        );
    }
}
