use serde::Deserialize;
use serde_json::{Map, Value};

/// A catalog entry as the platform writes it; every field may be absent or null
#[derive(Debug, Deserialize)]
struct RawBinding {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    credentials: Option<Map<String, Value>>,
}

/// One bound service instance
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceBinding {
    pub name: String,
    /// Service type; taken from the entry's `label`, or the catalog key
    pub label: String,
    pub tags: Vec<String>,
    credentials: Map<String, Value>,
}

impl ServiceBinding {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        tags: Vec<String>,
        credentials: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            tags,
            credentials,
        }
    }

    /// Decode one catalog entry; `label` falls back to the catalog key
    pub(crate) fn from_json(type_name: &str, value: &Value) -> Result<Self, serde_json::Error> {
        let raw = RawBinding::deserialize(value)?;
        Ok(Self {
            name: raw.name.unwrap_or_default(),
            label: raw.label.unwrap_or_else(|| type_name.to_string()),
            tags: raw.tags.unwrap_or_default(),
            credentials: raw.credentials.unwrap_or_default(),
        })
    }

    /// First alias present as a non-empty scalar, rendered as a string.
    ///
    /// Numbers with no fractional part render without a decimal point, so a
    /// port bound as `9001` or `9001.0` both come back as `"9001"`. Objects,
    /// arrays, nulls and empty strings count as absent and the next alias is
    /// tried.
    pub fn credential(&self, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .find_map(|alias| self.credentials.get(*alias).and_then(scalar_to_string))
    }

    pub fn has_credential(&self, aliases: &[&str]) -> bool {
        self.credential(aliases).is_some()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{:.0}", f)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn binding(credentials: Value) -> ServiceBinding {
        ServiceBinding::from_json(
            "apm",
            &json!({ "name": "apm", "credentials": credentials }),
        )
        .unwrap()
    }

    #[test]
    fn test_first_present_alias_wins() {
        let b = binding(json!({ "agent_url": "https://b", "url": "https://a" }));
        assert_eq!(b.credential(&["url", "agent_url"]).as_deref(), Some("https://a"));

        let b = binding(json!({ "agent_url": "https://b" }));
        assert_eq!(b.credential(&["url", "agent_url"]).as_deref(), Some("https://b"));
    }

    #[test]
    fn test_numeric_credentials() {
        let b = binding(json!({ "em_port": 8081, "ratio": 0.5, "big": 9001.0 }));
        assert_eq!(b.credential(&["em_port"]).as_deref(), Some("8081"));
        assert_eq!(b.credential(&["ratio"]).as_deref(), Some("0.5"));
        assert_eq!(b.credential(&["big"]).as_deref(), Some("9001"));
    }

    #[test]
    fn test_non_scalars_and_empty_strings_are_skipped() {
        let b = binding(json!({
            "url": { "nested": true },
            "uri": "",
            "endpoint": null,
            "agent_url": "https://fallback"
        }));
        assert_eq!(
            b.credential(&["url", "uri", "endpoint", "agent_url"]).as_deref(),
            Some("https://fallback")
        );
        assert!(!b.has_credential(&["url", "uri", "endpoint"]));
    }

    #[test]
    fn test_booleans_render_as_text() {
        let b = binding(json!({ "enableUpgrade": true }));
        assert_eq!(b.credential(&["enableUpgrade"]).as_deref(), Some("true"));
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(ServiceBinding::from_json("x", &json!("text")).is_err());
        let b = ServiceBinding::from_json("x", &json!({})).unwrap();
        assert_eq!(b.label, "x");
        assert!(b.name.is_empty());
        assert!(b.tags.is_empty());
    }

    #[test]
    fn test_null_fields_read_as_absent() {
        let b = ServiceBinding::from_json(
            "apm",
            &json!({ "name": "a", "label": null, "tags": null, "credentials": null }),
        )
        .unwrap();
        assert_eq!(b.label, "apm");
        assert!(b.tags.is_empty());
        assert!(!b.has_credential(&["url"]));
    }

    #[test]
    fn test_mistyped_fields_are_rejected() {
        assert!(ServiceBinding::from_json("apm", &json!({ "name": 7 })).is_err());
        assert!(ServiceBinding::from_json("apm", &json!({ "tags": "apm" })).is_err());
        assert!(ServiceBinding::from_json("apm", &json!({ "credentials": [] })).is_err());
    }
}
