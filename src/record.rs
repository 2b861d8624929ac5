//! User-data record access
//!
//! The data source collaborator supplies an arbitrarily nested key-value
//! document. The engine treats it as read-only, flattens it once per pass
//! into dotted scalar paths, and coerces every value to a string for
//! matching purposes.

use serde_json::Value;
use std::collections::BTreeMap;

/// Read-only wrapper over the nested user-data document.
#[derive(Debug, Clone)]
pub struct DataRecord {
    root: Value,
}

impl DataRecord {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse a record from its JSON text form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Flatten to a map of dotted scalar-leaf paths.
    ///
    /// Numbers and booleans are coerced to strings; arrays are joined with
    /// `", "`. Intermediate objects contribute path segments only, never
    /// values. Key paths are unique by construction.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        flatten_value(&self.root, String::new(), &mut out);
        out
    }

    /// Look up a dotted path, falling back to case-insensitive segment
    /// comparison when the exact-case key is absent.
    pub fn lookup(&self, path: &str) -> Option<String> {
        let mut current = &self.root;
        for segment in path.split('.') {
            let obj = current.as_object()?;
            current = match obj.get(segment) {
                Some(v) => v,
                None => {
                    let lower = segment.to_lowercase();
                    obj.iter()
                        .find(|(k, _)| k.to_lowercase() == lower)
                        .map(|(_, v)| v)?
                }
            };
        }
        scalar_to_string(current)
    }

    /// Whether any flattened key path contains the given normalized token.
    pub fn has_key_containing(&self, token: &str) -> bool {
        self.flatten().keys().any(|k| k.contains(token))
    }
}

fn flatten_value(value: &Value, prefix: String, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_value(child, path, out);
            }
        }
        other => {
            if prefix.is_empty() {
                return;
            }
            if let Some(s) = scalar_to_string(other) {
                out.insert(prefix, s);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataRecord {
        DataRecord::new(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "age": 36,
            "subscribed": true,
            "education": {
                "college": {
                    "name": "University of London",
                    "gpa": 3.9
                }
            },
            "skills": ["math", "analysis"]
        }))
    }

    #[test]
    fn test_flatten_scalar_leaves() {
        let flat = sample().flatten();
        assert_eq!(flat.get("first_name").unwrap(), "Ada");
        assert_eq!(flat.get("age").unwrap(), "36");
        assert_eq!(flat.get("subscribed").unwrap(), "true");
        assert_eq!(
            flat.get("education.college.name").unwrap(),
            "University of London"
        );
        assert_eq!(flat.get("education.college.gpa").unwrap(), "3.9");
        assert_eq!(flat.get("skills").unwrap(), "math, analysis");
        // No intermediate-object keys
        assert!(!flat.contains_key("education"));
        assert!(!flat.contains_key("education.college"));
    }

    #[test]
    fn test_flatten_lookup_roundtrip() {
        let record = sample();
        for (path, value) in record.flatten() {
            assert_eq!(record.lookup(&path).as_deref(), Some(value.as_str()));
        }
    }

    #[test]
    fn test_lookup_case_insensitive_fallback() {
        let record = DataRecord::new(json!({"Education": {"College": {"GPA": "3.9"}}}));
        assert_eq!(record.lookup("education.college.gpa").as_deref(), Some("3.9"));
    }

    #[test]
    fn test_lookup_missing() {
        assert_eq!(sample().lookup("nonexistent.path"), None);
    }

    #[test]
    fn test_has_key_containing() {
        let record = sample();
        assert!(record.has_key_containing("email"));
        assert!(!record.has_key_containing("resume"));
    }
}
