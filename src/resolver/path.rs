//! Path expressions for nested lookups.
//!
//! Supported forms:
//!
//! - `user.name` - nested object keys
//! - `items[0]`, `items[0].sku` - array index
//! - `items.0` - numeric key, indexes into an array (or reads key `"0"` of an object)
//! - `a\.b` - escaped dot, reads the literal key `"a.b"`

use serde_json::Value as JsonValue;
use std::fmt;

/// A single step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key (or array index when numeric and the value is an array)
    Key(String),
    /// Array index from `[n]`
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    source: String,
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Parse a path expression.
    ///
    /// Parsing never fails: an unterminated bracket is read as part of a key,
    /// and a non-numeric bracket is read as a key.
    pub fn parse(path: &str) -> Self {
        Self {
            source: path.to_string(),
            segments: parse_segments(path),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walk `json` along this path.
    ///
    /// Returns `None` when any step is missing or has the wrong shape. An empty
    /// path locates nothing.
    pub fn lookup<'a>(&self, json: &'a JsonValue) -> Option<&'a JsonValue> {
        if self.segments.is_empty() {
            return None;
        }

        let mut current = json;

        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), JsonValue::Object(map)) => map.get(key)?,
                (PathSegment::Key(key), JsonValue::Array(arr)) => {
                    arr.get(key.parse::<usize>().ok()?)?
                }
                (PathSegment::Index(idx), JsonValue::Array(arr)) => arr.get(*idx)?,
                _ => return None,
            };
        }

        Some(current)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }

                if !closed {
                    current.push('[');
                    current.push_str(&inner);
                    continue;
                }

                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
                match inner.trim().parse::<usize>() {
                    Ok(idx) => segments.push(PathSegment::Index(idx)),
                    Err(_) => segments.push(PathSegment::Key(inner)),
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(parts: &[&str]) -> Vec<PathSegment> {
        parts.iter().map(|p| PathSegment::Key(p.to_string())).collect()
    }

    #[test]
    fn test_parse_nested_keys() {
        let path = JsonPath::parse("user.address.city");
        assert_eq!(path.segments(), keys(&["user", "address", "city"]).as_slice());
        assert_eq!(path.to_string(), "user.address.city");
    }

    #[test]
    fn test_parse_index() {
        let path = JsonPath::parse("items[2].sku");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("items".to_string()),
                PathSegment::Index(2),
                PathSegment::Key("sku".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_escaped_dot() {
        let path = JsonPath::parse(r"meta.version\.major");
        assert_eq!(path.segments(), keys(&["meta", "version.major"]).as_slice());
    }

    #[test]
    fn test_parse_odd_brackets() {
        assert_eq!(JsonPath::parse("a[b]").segments(), keys(&["a", "b"]).as_slice());
        assert_eq!(JsonPath::parse("a[1").segments(), keys(&["a[1"]).as_slice());
        assert!(JsonPath::parse("").is_empty());
        assert!(JsonPath::parse("..").is_empty());
    }

    #[test]
    fn test_lookup() {
        let doc = json!({
            "user": { "name": "John", "tags": ["a", "b"] },
            "items": [{ "sku": "X-1" }, { "sku": "X-2" }],
            "0": "zero"
        });

        assert_eq!(JsonPath::parse("user.name").lookup(&doc), Some(&json!("John")));
        assert_eq!(JsonPath::parse("items[1].sku").lookup(&doc), Some(&json!("X-2")));
        assert_eq!(JsonPath::parse("user.tags.0").lookup(&doc), Some(&json!("a")));
        assert_eq!(JsonPath::parse("0").lookup(&doc), Some(&json!("zero")));
        assert_eq!(JsonPath::parse("user").lookup(&doc), doc.get("user"));
    }

    #[test]
    fn test_lookup_absent() {
        let doc = json!({ "a": "b", "list": [1, 2] });

        assert_eq!(JsonPath::parse("a.b").lookup(&doc), None);
        assert_eq!(JsonPath::parse("missing").lookup(&doc), None);
        assert_eq!(JsonPath::parse("list[5]").lookup(&doc), None);
        assert_eq!(JsonPath::parse("a[0]").lookup(&doc), None);
        assert_eq!(JsonPath::parse("list.x").lookup(&doc), None);
        assert_eq!(JsonPath::parse("").lookup(&doc), None);
    }
}
