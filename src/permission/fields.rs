use crate::model::{FieldAccess, PermissionSnapshot};
use crate::store::{FieldCatalog, PermissionStore, UserDirectory};
use crate::view::ViewType;

/// Resolves which fields of an entity a user may see and edit in a view.
pub struct FieldResolver<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> FieldResolver<'s, S>
where
    S: FieldCatalog + UserDirectory + PermissionStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Access flags for every field defined on `entity`, in field order.
    ///
    /// Rows missing for the user's role fall back to [`ViewType::defaults`].
    /// Users are not checked for activity here; an unknown user simply has no
    /// rows. `form_view` is never editable.
    pub fn field_permissions(&self, user_id: &str, entity: &str, view: ViewType) -> Vec<FieldAccess> {
        let role = self.store.role_of(user_id).map(|r| r.role);
        let defaults = view.defaults();

        self.store
            .fields_of(entity)
            .into_iter()
            .map(|def| {
                let row = role
                    .as_deref()
                    .and_then(|role| self.store.field_permission(role, entity, &def.name));
                let visible = row.as_ref().map_or(defaults.visible, |r| r.visible_in(view));
                let editable = !view.is_read_only()
                    && row.as_ref().map_or(defaults.editable, |r| r.editable_in(view));
                FieldAccess {
                    field: def.name,
                    visible,
                    editable,
                }
            })
            .collect()
    }

    pub fn visible_fields(&self, user_id: &str, entity: &str, view: ViewType) -> Vec<String> {
        self.field_permissions(user_id, entity, view)
            .into_iter()
            .filter(|a| a.visible)
            .map(|a| a.field)
            .collect()
    }

    pub fn editable_fields(&self, user_id: &str, entity: &str, view: ViewType) -> Vec<String> {
        self.field_permissions(user_id, entity, view)
            .into_iter()
            .filter(|a| a.editable)
            .map(|a| a.field)
            .collect()
    }

    /// False for fields not defined on the entity.
    pub fn can_see_field(&self, user_id: &str, entity: &str, field: &str, view: ViewType) -> bool {
        self.field_permissions(user_id, entity, view)
            .iter()
            .find(|a| a.field == field)
            .is_some_and(|a| a.visible)
    }

    /// False for fields not defined on the entity.
    pub fn can_edit_field(&self, user_id: &str, entity: &str, field: &str, view: ViewType) -> bool {
        self.field_permissions(user_id, entity, view)
            .iter()
            .find(|a| a.field == field)
            .is_some_and(|a| a.editable)
    }

    pub fn snapshot(&self, user_id: &str, entity: &str, view: ViewType) -> PermissionSnapshot {
        PermissionSnapshot::from_access(&self.field_permissions(user_id, entity, view))
    }
}
