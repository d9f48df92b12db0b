//! The preferences document: `domain → key → value`.
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{malformed, ordered_map, root_object, take_object};
use crate::error::CiderError;
use crate::store;

/// A single preference domain and its keys, in document order.
pub type Domain = (String, Vec<(String, Value)>);

/// Typed copy of the preferences document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    /// Domains in document order.
    pub domains: Vec<Domain>,
}

#[derive(Deserialize)]
struct DomainKeys(#[serde(deserialize_with = "ordered_map")] Vec<(String, Value)>);

impl Preferences {
    /// Read the preferences document; an absent file is an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or a
    /// domain is not an object.
    pub fn read(path: &Path) -> Result<Self, CiderError> {
        let doc = store::load(path, Some(Value::Object(Map::new())))?;
        let Value::Object(object) = doc else {
            return Err(malformed(path, "top-level value must be an object"));
        };
        let mut domains = Vec::with_capacity(object.len());
        for (domain, keys) in object {
            let DomainKeys(keys) = DomainKeys::deserialize(&keys)
                .map_err(|e| malformed(path, &format!("domain \"{domain}\": {e}")))?;
            domains.push((domain, keys));
        }
        Ok(Self { domains })
    }

    /// Number of `domain/key` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.iter().map(|(_, keys)| keys.len()).sum()
    }

    /// Whether the document holds no pairs at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Record `domain/key = value`.  Returns `true` if the file changed.
///
/// # Errors
///
/// Returns an error if the document cannot be read or written or the domain
/// entry is not an object.
pub fn set_value(path: &Path, domain: &str, key: &str, value: Value) -> Result<bool, CiderError> {
    store::modify(path, |mut doc| {
        let object = root_object(&mut doc, path)?;
        let mut keys = take_object(object, domain, path)?;
        keys.insert(key.to_string(), value);
        object.insert(domain.to_string(), Value::Object(keys));
        Ok(doc)
    })
}

/// Drop `domain/key`.  A domain left without keys is removed as well.
///
/// # Errors
///
/// Returns an error if the document cannot be read or written or the domain
/// entry is not an object.
pub fn remove_value(path: &Path, domain: &str, key: &str) -> Result<bool, CiderError> {
    store::modify(path, |mut doc| {
        let object = root_object(&mut doc, path)?;
        if object.contains_key(domain) {
            let mut keys = take_object(object, domain, path)?;
            keys.remove(key);
            if !keys.is_empty() {
                object.insert(domain.to_string(), Value::Object(keys));
            }
        }
        Ok(doc)
    })
}

/// Interpret a value typed on the command line.
///
/// The words `yes`/`y` and `no`/`n` (any case) become booleans; anything
/// else that parses as JSON is taken as JSON; the rest is a plain string.
#[must_use]
pub fn parse_value(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => return Value::Bool(true),
        "no" | "n" | "false" => return Value::Bool(false),
        _ => {}
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn absent_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::read(&dir.path().join("defaults.json")).unwrap();
        assert!(prefs.is_empty());
    }

    #[test]
    fn read_keeps_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");
        fs::write(
            &path,
            r#"{"com.apple.dock": {"tilesize": 36, "autohide": true}, "NSGlobalDomain": {"a": "b"}}"#,
        )
        .unwrap();
        let prefs = Preferences::read(&path).unwrap();
        assert_eq!(prefs.len(), 3);
        assert_eq!(prefs.domains[0].0, "com.apple.dock");
        assert_eq!(prefs.domains[0].1[0], ("tilesize".to_string(), json!(36)));
        assert_eq!(prefs.domains[1].0, "NSGlobalDomain");
    }

    #[test]
    fn domain_of_wrong_shape_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");
        fs::write(&path, r#"{"com.apple.dock": [1, 2]}"#).unwrap();
        assert!(matches!(
            Preferences::read(&path),
            Err(CiderError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn set_then_remove_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");

        assert!(set_value(&path, "com.apple.dock", "autohide", json!(true)).unwrap());
        assert!(!set_value(&path, "com.apple.dock", "autohide", json!(true)).unwrap());
        assert!(set_value(&path, "com.apple.dock", "tilesize", json!(36)).unwrap());

        assert!(remove_value(&path, "com.apple.dock", "autohide").unwrap());
        assert_eq!(
            store::load(&path, None).unwrap(),
            json!({"com.apple.dock": {"tilesize": 36}})
        );

        assert!(remove_value(&path, "com.apple.dock", "tilesize").unwrap());
        assert_eq!(store::load(&path, None).unwrap(), json!({}));
        assert!(!remove_value(&path, "com.apple.dock", "tilesize").unwrap());
    }

    #[test]
    fn parse_value_word_tokens() {
        assert_eq!(parse_value("YES"), json!(true));
        assert_eq!(parse_value("y"), json!(true));
        assert_eq!(parse_value("No"), json!(false));
        assert_eq!(parse_value("n"), json!(false));
    }

    #[test]
    fn parse_value_json_then_string() {
        assert_eq!(parse_value("36"), json!(36));
        assert_eq!(parse_value("1.5"), json!(1.5));
        assert_eq!(parse_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_value(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(parse_value("Menlo"), json!("Menlo"));
        assert_eq!(parse_value(""), json!(""));
    }
}
