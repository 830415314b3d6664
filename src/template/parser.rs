use crate::template::ast::Node;
use crate::template::expr::Condition;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind<'a> {
    Text,
    Variable { path: &'a str, raw: bool },
    IfOpen(&'a str),
    IfClose,
    SectionOpen(&'a str),
    SectionClose(&'a str),
}

/// A token and the exact source text it came from, so that tags which end up
/// unmatched can be emitted back as literal text.
#[derive(Debug, Clone)]
struct Token<'a> {
    kind: TokenKind<'a>,
    source: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stop<'a> {
    Top,
    If,
    Section(&'a str),
}

impl Stop<'_> {
    fn closed_by(&self, kind: &TokenKind) -> bool {
        match (self, kind) {
            (Stop::If, TokenKind::IfClose) => true,
            (Stop::Section(name), TokenKind::SectionClose(close)) => name == close,
            _ => false,
        }
    }
}

/// Parse template source into nodes.
///
/// Unclosed blocks, stray closing tags, nested `{{#if}}` tags and anything
/// that is not a recognised tag (`{{> partial}}`, `{{@index}}`, ...) are kept
/// as literal text.
pub fn parse_template(source: &str) -> Vec<Node> {
    let tokens = tokenize(source);
    let (nodes, _, _) = parse_until(&tokens, 0, Stop::Top, &[]);
    merge_literals(nodes)
}

/// Remove every `{{path}}`/`{{{path}}}` token for which `remove` holds,
/// leaving all other source text byte-for-byte intact.
pub fn strip_placeholders<F>(source: &str, remove: F) -> String
where
    F: Fn(&str) -> bool,
{
    tokenize(source)
        .into_iter()
        .filter(|token| !matches!(token.kind, TokenKind::Variable { path, .. } if remove(path)))
        .map(|token| token.source)
        .collect()
}

// ─── Tokenizer ───────────────────────────────────────────────────────────────

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(offset) = source[pos..].find("{{") {
        let open = pos + offset;
        if open > pos {
            tokens.push(text(&source[pos..open]));
        }

        if source[open..].starts_with("{{{") {
            if let Some(close) = source[open + 3..].find("}}}") {
                let end = open + 3 + close + 3;
                let inner = source[open + 3..open + 3 + close].trim();
                let tag = &source[open..end];
                tokens.push(if is_path(inner) {
                    Token {
                        kind: TokenKind::Variable {
                            path: inner,
                            raw: true,
                        },
                        source: tag,
                    }
                } else {
                    text(tag)
                });
                pos = end;
                continue;
            }
        }

        let Some(close) = source[open + 2..].find("}}") else {
            tokens.push(text(&source[open..]));
            return tokens;
        };
        let end = open + 2 + close + 2;
        let inner = source[open + 2..open + 2 + close].trim();
        let tag = &source[open..end];
        tokens.push(Token {
            kind: classify(inner),
            source: tag,
        });
        pos = end;
    }

    if pos < source.len() {
        tokens.push(text(&source[pos..]));
    }
    tokens
}

fn text(source: &str) -> Token<'_> {
    Token {
        kind: TokenKind::Text,
        source,
    }
}

fn classify(inner: &str) -> TokenKind<'_> {
    if let Some(rest) = inner.strip_prefix("#if") {
        if rest.starts_with(char::is_whitespace) {
            return TokenKind::IfOpen(rest.trim());
        }
    }
    if inner == "/if" {
        return TokenKind::IfClose;
    }
    if let Some(name) = inner.strip_prefix('#') {
        let name = name.trim();
        if is_path(name) {
            return TokenKind::SectionOpen(name);
        }
        return TokenKind::Text;
    }
    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        if is_path(name) {
            return TokenKind::SectionClose(name);
        }
        return TokenKind::Text;
    }
    if is_path(inner) {
        return TokenKind::Variable {
            path: inner,
            raw: false,
        };
    }
    TokenKind::Text
}

/// Field paths: letters, digits, `_`, `-` and `.` separators.
fn is_path(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Parse tokens from `i` until the closing tag for `stop`.
///
/// Returns the nodes, the index of the next unconsumed token and whether the
/// closing tag was found. Hitting a closing tag of an enclosing block (or the
/// end of input) leaves the block unclosed without consuming that tag.
fn parse_until<'a>(
    tokens: &[Token<'a>],
    mut i: usize,
    stop: Stop<'a>,
    enclosing: &[Stop<'a>],
) -> (Vec<Node>, usize, bool) {
    let mut nodes = Vec::new();

    while i < tokens.len() {
        let token = &tokens[i];

        if stop.closed_by(&token.kind) {
            return (nodes, i + 1, true);
        }
        if enclosing.iter().any(|outer| outer.closed_by(&token.kind)) {
            return (nodes, i, false);
        }

        match &token.kind {
            TokenKind::Text | TokenKind::IfClose | TokenKind::SectionClose(_) => {
                nodes.push(Node::Literal(token.source.to_string()));
                i += 1;
            }
            TokenKind::Variable { path, raw } => {
                nodes.push(Node::Placeholder {
                    path: path.to_string(),
                    raw: *raw,
                });
                i += 1;
            }
            TokenKind::IfOpen(expr) => {
                let inside_if = stop == Stop::If || enclosing.contains(&Stop::If);
                if inside_if {
                    nodes.push(Node::Literal(token.source.to_string()));
                    i += 1;
                    continue;
                }
                let outer = with_stop(enclosing, stop);
                let (body, next, closed) = parse_until(tokens, i + 1, Stop::If, &outer);
                if closed {
                    nodes.push(Node::IfBlock {
                        condition: Condition::parse(expr),
                        body,
                    });
                    i = next;
                } else {
                    nodes.push(Node::Literal(token.source.to_string()));
                    i += 1;
                }
            }
            TokenKind::SectionOpen(name) => {
                let outer = with_stop(enclosing, stop);
                let (body, next, closed) =
                    parse_until(tokens, i + 1, Stop::Section(*name), &outer);
                if closed {
                    nodes.push(Node::Section {
                        name: name.to_string(),
                        body,
                    });
                    i = next;
                } else {
                    nodes.push(Node::Literal(token.source.to_string()));
                    i += 1;
                }
            }
        }
    }

    (nodes, i, stop == Stop::Top)
}

fn with_stop<'a>(enclosing: &[Stop<'a>], stop: Stop<'a>) -> Vec<Stop<'a>> {
    let mut outer = enclosing.to_vec();
    if stop != Stop::Top {
        outer.push(stop);
    }
    outer
}

fn merge_literals(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Literal(text) => {
                if let Some(Node::Literal(prev)) = merged.last_mut() {
                    prev.push_str(&text);
                } else {
                    merged.push(Node::Literal(text));
                }
            }
            Node::Section { name, body } => merged.push(Node::Section {
                name,
                body: merge_literals(body),
            }),
            Node::IfBlock { condition, body } => merged.push(Node::IfBlock {
                condition,
                body: merge_literals(body),
            }),
            placeholder => merged.push(placeholder),
        }
    }
    merged
}
