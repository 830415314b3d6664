//! Dot-path lookups over JSON-like records.
//!
//! Resolution never fails: a missing key, a non-object intermediate node or an
//! empty path all resolve to empty text.

use serde_json::Value;

/// Walk `path` (dot separated, e.g. `supplier.name`) through `data`.
///
/// Returns `None` when any segment is missing or an intermediate node is not
/// an object. A present `null` is returned as `Some(Value::Null)`.
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Resolve `path` to its text form.
pub fn resolve(data: &Value, path: &str) -> String {
    lookup(data, path).map(to_text).unwrap_or_default()
}

/// Like [`resolve`], accepting absent inputs.
pub fn resolve_optional(data: Option<&Value>, path: Option<&str>) -> String {
    match (data, path) {
        (Some(data), Some(path)) => resolve(data, path),
        _ => String::new(),
    }
}

/// Text form of a single value: strings verbatim, numbers and booleans in
/// canonical form, `null` as empty text, containers serialized as JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_top_level_string() {
        let data = json!({"name": "World"});
        assert_eq!(resolve(&data, "name"), "World");
    }

    #[test]
    fn resolves_nested_path() {
        let data = json!({"supplier": {"name": "Acme", "address": {"city": "Lyon"}}});
        assert_eq!(resolve(&data, "supplier.name"), "Acme");
        assert_eq!(resolve(&data, "supplier.address.city"), "Lyon");
    }

    #[test]
    fn numbers_and_booleans_use_canonical_text() {
        let data = json!({"qty": 12, "price": 9.5, "active": true});
        assert_eq!(resolve(&data, "qty"), "12");
        assert_eq!(resolve(&data, "price"), "9.5");
        assert_eq!(resolve(&data, "active"), "true");
    }

    #[test]
    fn misses_resolve_to_empty() {
        let data = json!({"supplier": "Acme", "notes": null});
        assert_eq!(resolve(&data, "missing"), "");
        assert_eq!(resolve(&data, "supplier.name"), "");
        assert_eq!(resolve(&data, "notes"), "");
        assert_eq!(resolve(&data, ""), "");
        assert_eq!(resolve(&Value::Null, "supplier"), "");
    }

    #[test]
    fn containers_serialize_as_json() {
        let data = json!({"tags": ["a", "b"]});
        assert_eq!(resolve(&data, "tags"), r#"["a","b"]"#);
    }

    #[test]
    fn optional_inputs_resolve_to_empty() {
        let data = json!({"name": "x"});
        assert_eq!(resolve_optional(None, Some("name")), "");
        assert_eq!(resolve_optional(Some(&data), None), "");
        assert_eq!(resolve_optional(Some(&data), Some("name")), "x");
    }

    #[test]
    fn lookup_distinguishes_null_from_missing() {
        let data = json!({"notes": null});
        assert_eq!(lookup(&data, "notes"), Some(&Value::Null));
        assert_eq!(lookup(&data, "other"), None);
    }
}
