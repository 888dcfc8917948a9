//! Value resolution against a parsed JSON document.

mod path;

pub use path::{JsonPath, PathSegment};

use serde_json::Value as JsonValue;
use std::fmt;

/// Where a rule looks for its value, fixed when the rule is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    /// Nested path expression (simple mode)
    Path(JsonPath),
    /// Flat top-level key (gated mode)
    Property(String),
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Path(path) => write!(f, "path:{}", path),
            KeySpec::Property(key) => write!(f, "property:{}", key),
        }
    }
}

/// Resolve `spec` against `json`. Never mutates the document.
pub fn resolve<'a>(json: &'a JsonValue, spec: &KeySpec) -> Option<&'a JsonValue> {
    match spec {
        KeySpec::Path(path) => path.lookup(json),
        KeySpec::Property(key) => json.as_object()?.get(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_path() {
        let doc = json!({ "order": { "lines": [{ "qty": 3 }] } });
        let spec = KeySpec::Path(JsonPath::parse("order.lines[0].qty"));
        assert_eq!(resolve(&doc, &spec), Some(&json!(3)));
    }

    #[test]
    fn test_resolve_property_is_flat() {
        let doc = json!({ "tenant": "acme", "user.id": 7, "user": { "id": 9 } });

        let spec = KeySpec::Property("tenant".to_string());
        assert_eq!(resolve(&doc, &spec), Some(&json!("acme")));

        // Dots are part of the key, not a traversal
        let spec = KeySpec::Property("user.id".to_string());
        assert_eq!(resolve(&doc, &spec), Some(&json!(7)));
    }

    #[test]
    fn test_resolve_property_non_object_root() {
        let spec = KeySpec::Property("0".to_string());
        assert_eq!(resolve(&json!(["a", "b"]), &spec), None);
        assert_eq!(resolve(&json!("text"), &spec), None);
    }

    #[test]
    fn test_resolve_absent() {
        let doc = json!({ "a": "b" });
        assert_eq!(resolve(&doc, &KeySpec::Path(JsonPath::parse("a.b"))), None);
        assert_eq!(resolve(&doc, &KeySpec::Property("b".to_string())), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeySpec::Path(JsonPath::parse("a.b")).to_string(), "path:a.b");
        assert_eq!(KeySpec::Property("a".to_string()).to_string(), "property:a");
    }
}
