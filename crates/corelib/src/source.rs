//! Raw value sources consulted by the resolver.
//!
//! Two kinds of source exist:
//! - [`Environment`]: process environment variables, looked up by a setting's
//!   alias. Highest precedence.
//! - [`PropertySource`]: a live key/value store looked up by a setting's dotted
//!   key. [`DynamicProperties`] is the in-process implementation; it may be
//!   updated from any thread while readers resolve settings.

use std::collections::HashMap;
use std::path::Path;

use dashmap::DashMap;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default file name for the YAML properties document.
pub const DEFAULT_PROPERTIES_FILE: &str = "sidecar.yml";

/// Lookup of environment variables by name.
pub trait Environment: Send + Sync {
    /// The raw value, if the variable is set (possibly empty).
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables, for in-process injection.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// A raw value held by a property source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Scalar(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

/// A key/value store queried by dotted setting key.
pub trait PropertySource: Send + Sync {
    fn get(&self, key: &str) -> Option<PropertyValue>;
}

/// Live, concurrently updatable property store.
///
/// Writers call [`set`](Self::set) / [`remove`](Self::remove) through `&self`;
/// the last write for a key wins. Readers never block each other.
#[derive(Debug, Default)]
pub struct DynamicProperties {
    values: DashMap<String, PropertyValue>,
}

impl DynamicProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<PropertyValue> {
        self.values.remove(key).map(|(_, value)| value)
    }

    pub fn clear(&self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge a YAML properties document into the store.
    ///
    /// Nested mappings are flattened into dotted keys, so
    /// `dm: { dyno: { rack: rac1 } }` and `dm.dyno.rack: rac1` are
    /// equivalent. Returns the number of keys written.
    pub fn load_yaml_str(&self, document: &str) -> Result<usize> {
        let root: Value = serde_yaml::from_str(document)
            .map_err(|e| Error::MalformedProperties(e.to_string()))?;
        let mut flat = Vec::new();
        match root {
            Value::Null => {}
            Value::Mapping(_) => flatten(None, root, &mut flat),
            _ => {
                return Err(Error::MalformedProperties(
                    "document root must be a mapping".to_string(),
                ))
            }
        }

        let written = flat.len();
        for (key, value) in flat {
            self.values.insert(key, value);
        }
        Ok(written)
    }

    /// Merge a YAML properties file into the store. A missing file is not an
    /// error: nothing is loaded.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let document = match std::fs::read_to_string(path) {
            Ok(document) => document,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "properties file not found, skipping");
                return Ok(0);
            }
            Err(source) => {
                return Err(Error::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let written = self.load_yaml_str(&document)?;
        debug!(path = %path.display(), keys = written, "loaded properties file");
        Ok(written)
    }
}

impl PropertySource for DynamicProperties {
    fn get(&self, key: &str) -> Option<PropertyValue> {
        self.values.get(key).map(|entry| entry.value().clone())
    }
}

fn flatten(prefix: Option<&str>, value: Value, out: &mut Vec<(String, PropertyValue)>) {
    match value {
        Value::Mapping(mapping) => {
            for (k, v) in mapping {
                let Some(segment) = scalar_text(&k) else {
                    warn!(?k, "ignoring non-scalar property key");
                    continue;
                };
                let key = match prefix {
                    Some(prefix) => format!("{prefix}.{segment}"),
                    None => segment,
                };
                flatten(Some(key.as_str()), v, out);
            }
        }
        Value::Sequence(items) => {
            if let Some(key) = prefix {
                let items = items.iter().filter_map(scalar_text).collect();
                out.push((key.to_string(), PropertyValue::List(items)));
            }
        }
        Value::Tagged(tagged) => flatten(prefix, tagged.value, out),
        Value::Null => {}
        scalar => {
            if let (Some(key), Some(text)) = (prefix, scalar_text(&scalar)) {
                out.push((key.to_string(), PropertyValue::Scalar(text)));
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_environment() {
        let env = MapEnvironment::new().with("DM_RACK", "rac1");
        assert_eq!(env.var("DM_RACK").as_deref(), Some("rac1"));
        assert_eq!(env.var("DM_DATACENTER"), None);
    }

    #[test]
    fn test_set_and_remove() {
        let props = DynamicProperties::new();
        props.set("dm.dyno.rack", "rac1");
        props.set("dm.dyno.rack", "rac2");
        assert_eq!(props.get("dm.dyno.rack"), Some(PropertyValue::from("rac2")));
        assert_eq!(props.len(), 1);

        assert!(props.remove("dm.dyno.rack").is_some());
        assert!(props.is_empty());
    }

    #[test]
    fn test_yaml_flattening() {
        let props = DynamicProperties::new();
        let written = props
            .load_yaml_str(
                r#"
dm:
  dynomite:
    client.port: 9102
    multi.dc: false
  zones.available: [us-east-1a, us-east-1c]
dm.dyno.rack: rac9
ignored: ~
"#,
            )
            .unwrap();

        assert_eq!(written, 4);
        assert_eq!(
            props.get("dm.dynomite.client.port"),
            Some(PropertyValue::from("9102"))
        );
        assert_eq!(
            props.get("dm.dynomite.multi.dc"),
            Some(PropertyValue::from("false"))
        );
        assert_eq!(
            props.get("dm.zones.available"),
            Some(PropertyValue::List(vec![
                "us-east-1a".to_string(),
                "us-east-1c".to_string()
            ]))
        );
        assert_eq!(props.get("dm.dyno.rack"), Some(PropertyValue::from("rac9")));
        assert_eq!(props.get("ignored"), None);
    }

    #[test]
    fn test_yaml_root_must_be_mapping() {
        let props = DynamicProperties::new();
        assert!(props.load_yaml_str("- a\n- b\n").is_err());
        assert!(props.load_yaml_str("dm: [unclosed").is_err());
        assert_eq!(props.load_yaml_str("").unwrap(), 0);
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let props = DynamicProperties::new();
        let written = props.load_file(dir.path().join(DEFAULT_PROPERTIES_FILE)).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_PROPERTIES_FILE);
        std::fs::write(&path, "dm.datastore.engine: ardb\n").unwrap();

        let props = DynamicProperties::new();
        assert_eq!(props.load_file(&path).unwrap(), 1);
        assert_eq!(
            props.get("dm.datastore.engine"),
            Some(PropertyValue::from("ardb"))
        );
    }
}
