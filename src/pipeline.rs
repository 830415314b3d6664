use serde_json::Value;

use crate::applicator::apply_snapshot;
use crate::error::{GuardError, GuardResult};
use crate::permission::{ActionEvaluator, FieldResolver};
use crate::store::{FieldCatalog, PermissionStore, TemplateStore, UserDirectory};
use crate::template::render;
use crate::view::ViewType;

/// Renders an entity view for a user: active template, permission snapshot,
/// structural masking, then substitution.
///
/// The template is masked before rendering, so hidden values are never
/// substituted into the output.
pub struct ViewRenderer<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> ViewRenderer<'s, S>
where
    S: FieldCatalog + UserDirectory + PermissionStore + TemplateStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn fields(&self) -> FieldResolver<'s, S> {
        FieldResolver::new(self.store)
    }

    pub fn actions(&self) -> ActionEvaluator<'s, S> {
        ActionEvaluator::new(self.store)
    }

    pub fn render_view(
        &self,
        user_id: &str,
        entity: &str,
        view: ViewType,
        data: &Value,
    ) -> GuardResult<String> {
        let template = self.store.active_template(entity, view).ok_or_else(|| {
            GuardError::TemplateNotFound {
                entity: entity.to_string(),
                view: view.to_string(),
            }
        })?;
        Ok(self.render_template(&template, user_id, entity, view, data))
    }

    /// Same as [`ViewRenderer::render_view`] with a caller-supplied template.
    pub fn render_template(
        &self,
        template: &str,
        user_id: &str,
        entity: &str,
        view: ViewType,
        data: &Value,
    ) -> String {
        let snapshot = self.fields().snapshot(user_id, entity, view);
        let masked = apply_snapshot(template, &snapshot, view);
        render(&masked, data)
    }
}
