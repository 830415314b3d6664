//! # formguard
//!
//! Permission-aware template rendering for record views.
//!
//! Given a template, a JSON-like record and the requesting user, formguard
//! produces an HTML fragment where:
//! - every value is substituted and HTML-escaped by default (`{{{raw}}}` opts out);
//! - array blocks are expanded and conditional blocks kept or dropped;
//! - fields the user's role may not see are removed, and fields it may see
//!   but not edit are rendered disabled.
//!
//! Action-level checks ("may this user edit this purchase order?") are
//! evaluated separately by [`ActionEvaluator`], optionally against a record
//! through a condition rule.
//!
//! Every public operation is total: lookups that miss resolve to empty text,
//! and authorization problems resolve to "deny".
//!
//! ## Example
//! ```
//! use formguard::{render, apply_field_permissions};
//! use serde_json::json;
//!
//! let html = render("<div>Hello {{name}}!</div>", &json!({"name": "World"}));
//! assert_eq!(html, "<div>Hello World!</div>");
//!
//! let masked = apply_field_permissions(
//!     r#"<input name="salary" value="{{salary}}"><input name="name">"#,
//!     &["name"],
//!     &["name"],
//! );
//! assert_eq!(masked, r#"<input name="name">"#);
//! ```

pub mod applicator;
pub mod error;
pub mod escape;
pub mod model;
pub mod permission;
pub mod pipeline;
pub mod store;
pub mod template;
pub mod value;
pub mod view;

// --- Core types ---
pub use error::{GuardError, GuardResult};
pub use model::{
    ActionAccess, ActionCheck, ActionPermission, ConditionRule, FieldAccess, FieldDefinition,
    FieldPermission, Operator, PermissionSnapshot, UserRole, ADMIN_ROLE, CURRENT_USER,
};
pub use view::{DefaultPolicy, ViewType};

// --- Rendering ---
pub use escape::{escape_html, escape_html_opt};
pub use template::{evaluate_condition, render, render_array, render_optional, Template};
pub use value::{resolve, resolve_optional};

// --- Authorization ---
pub use applicator::{apply_field_permissions, apply_snapshot, FieldMask, Strategy};
pub use permission::{evaluate_rule, ActionEvaluator, FieldResolver};
pub use pipeline::ViewRenderer;
pub use store::{FieldCatalog, MemoryStore, PermissionStore, TemplateStore, UserDirectory};
