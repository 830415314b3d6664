//! Field permission applicator.
//!
//! Takes markup (a raw template or rendered output) and a permission snapshot
//! and enforces it structurally:
//!
//! - hidden fields lose every fragment carrying them: table header and data
//!   cells, `form-field` containers and the form controls themselves;
//! - visible but read-only fields get `disabled` on their controls (`<input>`
//!   also gets `readonly`) and their `form-field` container gets the
//!   `readonly` class.
//!
//! A field is "referenced" by a `{{field}}`/`{{{field}}}` placeholder, a
//! `data-field="field"` marker or a form control `name="field"`.

pub mod scan;

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::model::PermissionSnapshot;
use crate::template::parser::strip_placeholders;
use crate::template::Template;
use crate::view::ViewType;
use scan::{start_tags, transform_elements, with_class, with_flags, Edit, StartTag};

/// Class marking a labelled field container.
pub const FORM_FIELD_CLASS: &str = "form-field";

/// Class added to containers of read-only fields.
pub const READONLY_CLASS: &str = "readonly";

const CONTROLS: &[&str] = &["input", "select", "textarea"];
const TABLE_CELLS: &[&str] = &["th", "td"];

/// Which structural patterns are used to remove hidden fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Table header and data cells.
    Table,
    /// `form-field` containers.
    Form,
    /// Both.
    All,
}

impl Strategy {
    pub fn for_view(view: ViewType) -> Self {
        if view.is_form() {
            Strategy::Form
        } else {
            Strategy::Table
        }
    }

    fn tables(&self) -> bool {
        matches!(self, Strategy::Table | Strategy::All)
    }

    fn forms(&self) -> bool {
        matches!(self, Strategy::Form | Strategy::All)
    }
}

/// Hidden and read-only fields for one markup, computed once up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask {
    pub hidden: BTreeSet<String>,
    pub readonly: BTreeSet<String>,
}

impl FieldMask {
    /// Diff the fields referenced by `markup` against the snapshot.
    pub fn plan(markup: &str, snapshot: &PermissionSnapshot) -> Self {
        let mut mask = FieldMask::default();
        for field in referenced_fields(markup) {
            if !snapshot.governs(&field) {
                continue;
            }
            if !snapshot.is_visible(&field) {
                mask.hidden.insert(field);
            } else if !snapshot.is_editable(&field) {
                mask.readonly.insert(field);
            }
        }
        mask
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty() && self.readonly.is_empty()
    }

    pub fn apply(&self, markup: &str, strategy: Strategy) -> String {
        let mut html = markup.to_string();

        if !self.hidden.is_empty() {
            if strategy.tables() {
                html = transform_elements(&html, TABLE_CELLS, |tag, inner| {
                    if self.carries_any(tag, inner, &self.hidden) {
                        Edit::Remove
                    } else {
                        Edit::Keep
                    }
                });
            }
            if strategy.forms() {
                html = transform_elements(&html, &["div"], |tag, inner| {
                    if tag.has_class(FORM_FIELD_CLASS) && self.carries_any(tag, inner, &self.hidden)
                    {
                        Edit::Remove
                    } else {
                        Edit::Keep
                    }
                });
            }
            html = transform_elements(&html, CONTROLS, |tag, _| {
                if control_name(tag).is_some_and(|name| self.hidden.contains(name)) {
                    Edit::Remove
                } else {
                    Edit::Keep
                }
            });
            html = strip_placeholders(&html, |path| self.hidden.contains(path));
        }

        if !self.readonly.is_empty() {
            let source = html;
            html = transform_elements(&source, CONTROLS, |tag, _| {
                if !control_name(tag).is_some_and(|name| self.readonly.contains(name)) {
                    return Edit::Keep;
                }
                let flags: &[&str] = if tag.name == "input" {
                    &["disabled", "readonly"]
                } else {
                    &["disabled"]
                };
                Edit::ReplaceStartTag(with_flags(&source, tag, flags))
            });

            if strategy.forms() {
                let source = html;
                html = transform_elements(&source, &["div"], |tag, inner| {
                    if tag.has_class(FORM_FIELD_CLASS)
                        && self.carries_any(tag, inner, &self.readonly)
                    {
                        Edit::ReplaceStartTag(with_class(&source, tag, READONLY_CLASS))
                    } else {
                        Edit::Keep
                    }
                });
            }
        }

        normalize_whitespace(&html)
    }

    /// Whether an element is tagged with, or contains a reference to, one of
    /// `fields`.
    fn carries_any(&self, tag: &StartTag, inner: &str, fields: &BTreeSet<String>) -> bool {
        if tag.attr("data-field").is_some_and(|f| fields.contains(f)) {
            return true;
        }
        referenced_fields(inner).iter().any(|f| fields.contains(f))
    }
}

fn control_name(tag: &StartTag) -> Option<&str> {
    if CONTROLS.contains(&tag.name.as_str()) {
        tag.attr("name")
    } else {
        None
    }
}

/// Fields referenced in `markup`, in order of first appearance.
pub fn referenced_fields(markup: &str) -> Vec<String> {
    let mut fields = Template::parse(markup).placeholders();
    for tag in start_tags(markup) {
        let reference = tag.attr("data-field").or_else(|| control_name(&tag));
        if let Some(field) = reference {
            if !field.is_empty() && !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
    }
    fields
}

/// Collapse whitespace runs to one space and drop whitespace between tags.
pub fn normalize_whitespace(html: &str) -> String {
    static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
    static BETWEEN_TAGS_REGEX: OnceLock<Regex> = OnceLock::new();

    let whitespace = WHITESPACE_REGEX.get_or_init(|| Regex::new(r"\s+").unwrap());
    let between_tags = BETWEEN_TAGS_REGEX.get_or_init(|| Regex::new(r">\s+<").unwrap());

    let collapsed = whitespace.replace_all(html, " ");
    between_tags.replace_all(&collapsed, "><").trim().to_string()
}

/// Enforce `visible`/`editable` on `markup` using every removal pattern.
///
/// Every referenced field not in `visible` is hidden.
pub fn apply_field_permissions<V, E>(markup: &str, visible: &[V], editable: &[E]) -> String
where
    V: AsRef<str>,
    E: AsRef<str>,
{
    let snapshot = PermissionSnapshot::new(
        visible.iter().map(|f| f.as_ref().to_string()),
        editable.iter().map(|f| f.as_ref().to_string()),
    );
    FieldMask::plan(markup, &snapshot).apply(markup, Strategy::All)
}

/// Enforce a snapshot using the removal patterns suited to `view`.
pub fn apply_snapshot(markup: &str, snapshot: &PermissionSnapshot, view: ViewType) -> String {
    FieldMask::plan(markup, snapshot).apply(markup, Strategy::for_view(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldAccess;
    use pretty_assertions::assert_eq;

    const FORM: &str = r#"
<form>
  <div class="form-field">
    <label>Name</label>
    <input type="text" name="name" value="{{name}}">
  </div>
  <div class="form-field">
    <label>Email</label>
    <input type="email" name="email" value="{{email}}">
  </div>
  <div class="form-field">
    <label>Salary</label>
    <input type="number" name="salary" value="{{salary}}">
  </div>
</form>
"#;

    #[test]
    fn hides_and_disables_form_fields() {
        let out = apply_field_permissions(FORM, &["name", "email"], &["name"]);
        assert_eq!(
            out,
            concat!(
                r#"<form><div class="form-field"><label>Name</label><input type="text" name="name" value="{{name}}"></div>"#,
                r#"<div class="form-field readonly"><label>Email</label><input type="email" name="email" value="{{email}}" disabled readonly></div>"#,
                r#"</form>"#
            )
        );
    }

    #[test]
    fn removes_table_cells_and_headers() {
        let html = r#"<table>
  <tr><th data-field="po_number">PO</th><th data-field="notes">Notes</th></tr>
  {{#rows}}<tr><td>{{po_number}}</td><td>{{notes}}</td></tr>{{/rows}}
</table>"#;
        let out = apply_field_permissions(html, &["po_number"], &[] as &[&str]);
        assert_eq!(
            out,
            r#"<table><tr><th data-field="po_number">PO</th></tr> {{#rows}}<tr><td>{{po_number}}</td></tr>{{/rows}} </table>"#
        );
    }

    #[test]
    fn header_with_placeholder_is_removed() {
        let html = "<tr><th>{{salary_label}}</th><th>Name</th></tr>";
        let out = apply_field_permissions(html, &["name"], &["name"]);
        assert_eq!(out, "<tr><th>Name</th></tr>");
    }

    #[test]
    fn same_named_fields_in_one_row_do_not_over_match() {
        let html = "<tr><td>{{a}}</td><td>{{secret}}</td><td>{{a}}</td><td>{{secret}}</td></tr>";
        let out = apply_field_permissions(html, &["a"], &["a"]);
        assert_eq!(out, "<tr><td>{{a}}</td><td>{{a}}</td></tr>");
    }

    #[test]
    fn select_and_textarea_are_disabled_without_readonly() {
        let html = r#"<select name="status"><option>a</option></select><textarea name="memo">{{memo}}</textarea>"#;
        let out = apply_field_permissions(html, &["status", "memo"], &[] as &[&str]);
        assert_eq!(
            out,
            r#"<select name="status" disabled><option>a</option></select><textarea name="memo" disabled>{{memo}}</textarea>"#
        );
    }

    #[test]
    fn bare_hidden_controls_and_leftover_placeholders_vanish() {
        let html = r#"<p>Total: <span>{{{total}}}</span></p><input name="total" value="{{total}}">"#;
        let out = apply_field_permissions(html, &[] as &[&str], &[] as &[&str]);
        assert_eq!(out, "<p>Total: <span></span></p>");
    }

    #[test]
    fn hidden_wins_over_editable() {
        let html = r#"<input name="x">"#;
        assert_eq!(apply_field_permissions(html, &[] as &[&str], &["x"]), "");
    }

    #[test]
    fn view_strategy_limits_patterns() {
        let html = r#"<td>{{notes}}</td><div class="form-field"><span>{{notes}}</span></div>"#;
        let snapshot = PermissionSnapshot::new(Vec::<String>::new(), Vec::<String>::new());
        assert_eq!(
            apply_snapshot(html, &snapshot, ViewType::List),
            r#"<div class="form-field"><span></span></div>"#
        );
        assert_eq!(apply_snapshot(html, &snapshot, ViewType::FormView), "<td></td>");
    }

    #[test]
    fn undefined_fields_pass_through_snapshots() {
        let mut snapshot = PermissionSnapshot::new(["po_number"], Vec::<String>::new());
        snapshot.defined = Some(["po_number".to_string(), "notes".to_string()].into());
        let html = "{{#lines}}<td>{{sku}}</td><td>{{notes}}</td>{{/lines}}";
        assert_eq!(
            apply_snapshot(html, &snapshot, ViewType::List),
            "{{#lines}}<td>{{sku}}</td>{{/lines}}"
        );
    }

    #[test]
    fn nested_paths_under_hidden_field_are_removed() {
        let snapshot = PermissionSnapshot::from_access(&[
            FieldAccess { field: "po_number".into(), visible: true, editable: false },
            FieldAccess { field: "supplier".into(), visible: false, editable: false },
        ]);
        let html = concat!(
            r#"<table><tr><th data-field="po_number">PO</th><th data-field="supplier">Supplier</th></tr>"#,
            "{{#rows}}<tr><td>{{po_number}}</td><td>{{supplier.name}}</td></tr>{{/rows}}</table>"
        );
        assert_eq!(
            apply_snapshot(html, &snapshot, ViewType::List),
            concat!(
                r#"<table><tr><th data-field="po_number">PO</th></tr>"#,
                "{{#rows}}<tr><td>{{po_number}}</td></tr>{{/rows}}</table>"
            )
        );
    }

    #[test]
    fn works_on_rendered_markup_with_markers() {
        let html = r#"<tr><td data-field="po">PO-1</td><td data-field="notes">secret</td></tr>"#;
        let out = apply_field_permissions(html, &["po"], &[] as &[&str]);
        assert_eq!(out, r#"<tr><td data-field="po">PO-1</td></tr>"#);
    }

    #[test]
    fn plan_diffs_referenced_fields() {
        let snapshot = PermissionSnapshot::new(["a", "b"], ["a"]);
        let mask = FieldMask::plan("{{a}}{{b}}{{c}}<input name=\"d\">", &snapshot);
        assert_eq!(mask.hidden, ["c".to_string(), "d".to_string()].into());
        assert_eq!(mask.readonly, ["b".to_string()].into());
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_whitespace("  <a>\n  x   y </a>\n\t<b></b> "), "<a> x y </a><b></b>");
    }
}
