//! Template renderer.
//!
//! Templates are tokenized into a small AST ([`Node`]) and rendered by a
//! recursive visitor:
//!
//! - `{{#if expr}}...{{/if}}` keeps its body when `expr` holds, otherwise the
//!   whole block is dropped. No nesting, no `else`.
//! - `{{#name}}...{{/name}}` renders its body once per element of the array
//!   `name`, with the element as the data scope. Missing, non-array or empty
//!   values drop the block.
//! - `{{field}}` substitutes the HTML-escaped value, `{{{field}}}` the raw value.
//!   Missing fields render as empty text.
//!
//! Rendered values are never re-scanned for tags.

pub mod ast;
pub mod expr;
pub mod parser;

use serde_json::Value;

use crate::escape::escape_html;
use crate::value::{lookup, resolve};

pub use ast::Node;
pub use expr::{evaluate_condition, Condition};

/// A parsed template, reusable across data records.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        Self {
            nodes: parser::parse_template(source),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Paths of every `{{field}}`/`{{{field}}}` placeholder, including those
    /// inside block bodies. Block tags themselves are not included.
    pub fn placeholders(&self) -> Vec<String> {
        let mut out = Vec::new();
        Node::collect_placeholders(&self.nodes, &mut out);
        out
    }

    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, data, data, &mut out);
        out
    }
}

/// `scope` is the current array element (or the record at top level).
/// Conditions are always decided against `root`, the top-level record, even
/// inside array blocks.
fn render_nodes(nodes: &[Node], scope: &Value, root: &Value, out: &mut String) {
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Placeholder { path, raw } => {
                let value = resolve(scope, path);
                if *raw {
                    out.push_str(&value);
                } else {
                    out.push_str(&escape_html(&value));
                }
            }
            Node::Section { name, body } => {
                if let Some(Value::Array(items)) = lookup(scope, name) {
                    for item in items {
                        render_nodes(body, item, root, out);
                    }
                }
            }
            Node::IfBlock { condition, body } => {
                if condition.evaluate(root) {
                    render_nodes(body, scope, root, out);
                }
            }
        }
    }
}

/// Render `template` against `data`. A `null` record behaves like `{}`.
pub fn render(template: &str, data: &Value) -> String {
    Template::parse(template).render(data)
}

/// Like [`render`], accepting absent inputs: no template renders as empty
/// text, no data as an empty record.
pub fn render_optional(template: Option<&str>, data: Option<&Value>) -> String {
    match template {
        Some(template) => render(template, data.unwrap_or(&Value::Null)),
        None => String::new(),
    }
}

/// Render a template whose repeated parts are array blocks. Same pipeline as
/// [`render`].
pub fn render_array(template: &str, data: &Value) -> String {
    render(template, data)
}
