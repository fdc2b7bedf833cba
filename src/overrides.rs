//! Plugin override variables
//!
//! Operators tune individual plugins through variables named
//! `<PREFIX>_<UPPER_SNAKE_PLUGIN_NAME>`, e.g. `JBP_CONFIG_JMX='{enabled: true}'`.
//! The core only hands out the raw text; [`Overrides::decode`] is a
//! convenience for plugins whose override is a small YAML mapping.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_PREFIX: &str = "JBP_CONFIG";

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("Failed to parse {key}: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{key} must be a YAML mapping, found {found}")]
    UnexpectedShape { key: String, found: &'static str },
}

#[derive(Debug, Clone)]
pub struct Overrides {
    prefix: String,
    values: BTreeMap<String, String>,
}

impl Default for Overrides {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Overrides {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: BTreeMap::new(),
        }
    }

    /// Keep the variables that belong to `prefix`
    pub fn from_vars<I>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut overrides = Self::new(prefix);
        let wanted = format!("{}_", overrides.prefix);
        overrides.values = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with(&wanted))
            .collect();
        overrides
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        let key = self.env_key(name);
        self.values.insert(key, value.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `open-jdk jre` -> `JBP_CONFIG_OPEN_JDK_JRE`
    pub fn env_key(&self, name: &str) -> String {
        let snake: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_{}", self.prefix, snake)
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values
            .get(&self.env_key(name))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    /// Decode the override for `name` into `T`.
    ///
    /// Accepts a flow or block mapping, a quoted string holding a mapping, or
    /// the legacy list-of-single-key-mappings form (`[enabled: true, port: 1]`),
    /// whose entries are merged in order.
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, OverrideError> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        let key = self.env_key(name);

        let mapping = to_mapping(&key, parse_yaml(&key, raw)?)?;
        serde_yaml::from_value(Value::Mapping(mapping))
            .map(Some)
            .map_err(|source| OverrideError::Parse { key, source })
    }

    /// Like [`Overrides::decode`], but a malformed value is logged and the
    /// plugin's defaults are used instead.
    pub fn decode_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.decode(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed override, using defaults");
                T::default()
            }
        }
    }
}

/// `{version: 17.+}` style selector shared by every installable plugin.
/// YAML reads `17` as a number, so both numbers and strings are accepted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VersionSpec {
    #[serde(default)]
    version: Option<Value>,
}

impl VersionSpec {
    pub fn hint(&self) -> Option<String> {
        match self.version.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn parse_yaml(key: &str, raw: &str) -> Result<Value, OverrideError> {
    serde_yaml::from_str(raw).map_err(|source| OverrideError::Parse {
        key: key.to_string(),
        source,
    })
}

/// A quoted mapping (`'{enabled: true}'`) is unwrapped once; a scalar
/// left after that is the wrong shape.
fn to_mapping(key: &str, value: Value) -> Result<Mapping, OverrideError> {
    let value = match value {
        Value::String(inner) => parse_yaml(key, &inner)?,
        other => other,
    };

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Sequence(items) => {
            let mut merged = Mapping::new();
            for item in items {
                if let Value::Mapping(entry) = item {
                    merged.extend(entry);
                }
            }
            Ok(merged)
        }
        Value::Null => Ok(Mapping::new()),
        other => Err(OverrideError::UnexpectedShape {
            key: key.to_string(),
            found: match other {
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                Value::String(_) => "a string",
                _ => "a tagged value",
            },
        }),
    }
}
