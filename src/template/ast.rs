use crate::template::expr::Condition;

/// A parsed template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Text copied to the output unchanged.
    Literal(String),
    /// `{{path}}` (escaped) or `{{{path}}}` (raw).
    Placeholder { path: String, raw: bool },
    /// `{{#name}}...{{/name}}`, rendered once per element of the array `name`.
    Section { name: String, body: Vec<Node> },
    /// `{{#if expr}}...{{/if}}`.
    IfBlock { condition: Condition, body: Vec<Node> },
}

impl Node {
    /// Collect the paths of every placeholder in `nodes`, descending into
    /// section and conditional bodies, in order of first appearance.
    pub fn collect_placeholders(nodes: &[Node], out: &mut Vec<String>) {
        for node in nodes {
            match node {
                Node::Literal(_) => {}
                Node::Placeholder { path, .. } => {
                    if !out.iter().any(|p| p == path) {
                        out.push(path.clone());
                    }
                }
                Node::Section { body, .. } | Node::IfBlock { body, .. } => {
                    Node::collect_placeholders(body, out);
                }
            }
        }
    }
}
