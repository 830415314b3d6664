/// Escape text for inclusion in HTML.
///
/// Equivalent to replacing `&`, `<`, `>`, `"` and `'` in that order, so an
/// ampersand introduced by an entity is never escaped twice within one call.
/// Escaping already-escaped text double-encodes `&`: escape exactly once.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// `None` escapes to empty text.
pub fn escape_html_opt(text: Option<&str>) -> String {
    text.map(escape_html).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn single_characters_do_not_collide() {
        assert_eq!(escape_html("<"), "&lt;");
        assert_eq!(escape_html("&"), "&amp;");
    }

    #[test]
    fn escaping_twice_double_encodes_ampersand() {
        assert_eq!(escape_html(&escape_html("<")), "&amp;lt;");
    }

    #[test]
    fn none_is_empty() {
        assert_eq!(escape_html_opt(None), "");
        assert_eq!(escape_html_opt(Some("a<b")), "a&lt;b");
    }

    #[test]
    fn multibyte_text_is_untouched() {
        assert_eq!(escape_html("Café — 5€"), "Café — 5€");
    }
}
