//! Minimal HTML tag scanner.
//!
//! Finds start tags, their attributes and the matching end tag by counting
//! nesting depth of same-named elements. Not a full HTML parser: it only needs
//! to be robust for template markup (quoted attributes, `{{...}}` inside
//! attribute values and text, comments).

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    /// Byte range of the value inside the scanned document, quotes excluded.
    pub value_span: Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    /// Offset of `<`.
    pub start: usize,
    /// Offset just past `>`.
    pub end: usize,
    /// Lowercased tag name.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn is_void(&self) -> bool {
        self.self_closing || VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

/// What to do with a matched element.
pub enum Edit {
    Keep,
    /// Drop the element including its content and end tag.
    Remove,
    /// Replace only the start tag, then keep scanning inside the element.
    ReplaceStartTag(String),
}

/// Parse the start tag beginning at `at` (which must point at `<`).
fn parse_start_tag(html: &str, at: usize) -> Option<StartTag> {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let mut i = at + 1;

    if i >= len || !bytes[i].is_ascii_alphabetic() {
        return None;
    }
    let name_start = i;
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = html[name_start..i].to_ascii_lowercase();
    if i < len && !(bytes[i].is_ascii_whitespace() || bytes[i] == b'>' || bytes[i] == b'/') {
        return None;
    }

    let mut attributes = Vec::new();
    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            return None;
        }
        match bytes[i] {
            b'>' => {
                return Some(StartTag {
                    start: at,
                    end: i + 1,
                    name,
                    attributes,
                    self_closing: false,
                })
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'>' => {
                return Some(StartTag {
                    start: at,
                    end: i + 2,
                    name,
                    attributes,
                    self_closing: true,
                })
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < len
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'>'
            && bytes[i] != b'/'
        {
            i += 1;
        }
        let attr_name = html[attr_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < len && bytes[j] == b'=' {
            j += 1;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= len {
                return None;
            }
            let (value_start, value_end, next) = if bytes[j] == b'"' || bytes[j] == b'\'' {
                let quote = bytes[j];
                let value_start = j + 1;
                let close = html[value_start..].find(quote as char)? + value_start;
                (value_start, close, close + 1)
            } else {
                let value_start = j;
                let mut k = j;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                (value_start, k, k)
            };
            attributes.push(Attribute {
                name: attr_name,
                value: Some(html[value_start..value_end].to_string()),
                value_span: Some((value_start, value_end)),
            });
            i = next;
        } else {
            if attr_name.is_empty() {
                i += 1;
                continue;
            }
            attributes.push(Attribute {
                name: attr_name,
                value: None,
                value_span: None,
            });
        }
    }
}

/// Next start tag at or after `from`, skipping comments.
pub fn next_start_tag(html: &str, mut from: usize) -> Option<StartTag> {
    while from < html.len() {
        let at = from + html[from..].find('<')?;
        if html[at..].starts_with("<!--") {
            from = match html[at + 4..].find("-->") {
                Some(end) => at + 4 + end + 3,
                None => return None,
            };
            continue;
        }
        if let Some(tag) = parse_start_tag(html, at) {
            return Some(tag);
        }
        from = at + 1;
    }
    None
}

/// Every start tag in `html`, in document order.
pub fn start_tags(html: &str) -> Vec<StartTag> {
    let mut tags = Vec::new();
    let mut pos = 0;
    while let Some(tag) = next_start_tag(html, pos) {
        pos = tag.end;
        tags.push(tag);
    }
    tags
}

fn is_end_tag_of(html: &str, at: usize, name: &str) -> Option<usize> {
    let rest = &html[at..];
    if !rest.starts_with("</") {
        return None;
    }
    let after = &rest[2..];
    if after.len() < name.len()
        || !after.as_bytes()[..name.len()].eq_ignore_ascii_case(name.as_bytes())
    {
        return None;
    }
    let tail = after.get(name.len()..)?;
    let trimmed = tail.trim_start();
    if !trimmed.starts_with('>') {
        return None;
    }
    Some(at + 2 + name.len() + (tail.len() - trimmed.len()) + 1)
}

/// Locate the end tag matching an element named `name` whose content starts
/// at `from`. Returns `(content_end, element_end)`.
pub fn find_matching_close(html: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut pos = from;

    while pos < html.len() {
        let at = pos + html[pos..].find('<')?;
        if let Some(end) = is_end_tag_of(html, at, name) {
            depth -= 1;
            if depth == 0 {
                return Some((at, end));
            }
            pos = end;
            continue;
        }
        if html[at..].starts_with("<!--") {
            pos = at + 4 + html[at + 4..].find("-->")? + 3;
            continue;
        }
        match parse_start_tag(html, at) {
            Some(tag) if tag.name == name && !tag.self_closing => {
                depth += 1;
                pos = tag.end;
            }
            Some(tag) => pos = tag.end,
            None => pos = at + 1,
        }
    }
    None
}

/// Visit every element whose tag name is in `names` and apply the returned
/// [`Edit`]. `decide` receives the start tag and the element's inner markup.
///
/// Elements whose end tag cannot be found are left untouched.
pub fn transform_elements<F>(html: &str, names: &[&str], mut decide: F) -> String
where
    F: FnMut(&StartTag, &str) -> Edit,
{
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut pos = 0;

    while let Some(tag) = next_start_tag(html, pos) {
        if !names.contains(&tag.name.as_str()) {
            pos = tag.end;
            continue;
        }

        let (inner_end, outer_end) = if tag.is_void() {
            (tag.end, tag.end)
        } else {
            match find_matching_close(html, &tag.name, tag.end) {
                Some(span) => span,
                None => {
                    pos = tag.end;
                    continue;
                }
            }
        };

        match decide(&tag, &html[tag.end..inner_end]) {
            Edit::Keep => pos = tag.end,
            Edit::Remove => {
                out.push_str(&html[cursor..tag.start]);
                cursor = outer_end;
                pos = outer_end;
            }
            Edit::ReplaceStartTag(replacement) => {
                out.push_str(&html[cursor..tag.start]);
                out.push_str(&replacement);
                cursor = tag.end;
                pos = tag.end;
            }
        }
    }

    out.push_str(&html[cursor..]);
    out
}

/// Source of `tag` with boolean attributes appended (skipping ones already
/// present).
pub fn with_flags(html: &str, tag: &StartTag, flags: &[&str]) -> String {
    let source = &html[tag.start..tag.end];
    let body = source.trim_end_matches('>');
    let (body, closing) = match body.strip_suffix('/') {
        Some(body) => (body.trim_end(), "/>"),
        None => (body.trim_end(), ">"),
    };

    let mut out = body.to_string();
    for flag in flags {
        if !tag.has_attr(flag) {
            out.push(' ');
            out.push_str(flag);
        }
    }
    out.push_str(closing);
    out
}

/// Source of `tag` with `class` added to its class list.
pub fn with_class(html: &str, tag: &StartTag, class: &str) -> String {
    if tag.has_class(class) {
        return html[tag.start..tag.end].to_string();
    }
    let existing = tag
        .attributes
        .iter()
        .find(|a| a.name == "class")
        .and_then(|a| a.value_span);

    match existing {
        Some((value_start, value_end)) => {
            let mut out = html[tag.start..value_end].to_string();
            if value_end > value_start {
                out.push(' ');
            }
            out.push_str(class);
            out.push_str(&html[value_end..tag.end]);
            out
        }
        None => {
            let source = &html[tag.start..tag.end];
            let body = source.trim_end_matches('>');
            let (body, closing) = match body.strip_suffix('/') {
                Some(body) => (body.trim_end(), "/>"),
                None => (body.trim_end(), ">"),
            };
            format!("{} class=\"{}\"{}", body, class, closing)
        }
    }
}
