//! Service-binding credential resolver
//!
//! The platform hands the build a JSON catalog of bound services, keyed by
//! service type:
//!
//! ```json
//! { "newrelic": [ { "name": "apm", "label": "newrelic", "tags": ["apm"],
//!                   "credentials": { "licenseKey": "..." } } ] }
//! ```
//!
//! [`ServiceCatalog`] flattens it into an ordered list of [`ServiceBinding`]s
//! and answers the three questions every plugin asks: is there a binding of
//! this exact type, is there one carrying this tag, is there one whose name
//! contains this text. Matching is case-insensitive.
//!
//! # Ordering
//!
//! When several bindings match, the first one in catalog order wins. Catalog
//! order is the order of the JSON input; the platform does not promise a
//! stable order across restages, so two bindings matching the same query are
//! a configuration the plugin cannot resolve deterministically.
//!
//! # Failure semantics
//!
//! A missing or malformed catalog is never an error: it behaves exactly like
//! an empty one.

mod application;
mod binding;

pub use application::ApplicationMetadata;
pub use binding::ServiceBinding;

use serde_json::Value;
use tracing::{debug, warn};

/// Read-only view of the bound services for one build
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    bindings: Vec<ServiceBinding>,
}

impl ServiceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(bindings: Vec<ServiceBinding>) -> Self {
        Self { bindings }
    }

    /// Build the catalog from the raw environment value, if one was supplied
    pub fn from_env_value(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => Self::parse(raw),
            _ => Self::empty(),
        }
    }

    /// Parse a JSON catalog, degrading to an empty catalog on malformed input
    pub fn parse(raw: &str) -> Self {
        let root: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed service catalog");
                return Self::empty();
            }
        };

        let Value::Object(types) = root else {
            warn!("Ignoring service catalog that is not a JSON object");
            return Self::empty();
        };

        let mut bindings = Vec::new();
        for (type_name, instances) in &types {
            let Value::Array(instances) = instances else {
                debug!(service_type = %type_name, "Skipping non-array service entry");
                continue;
            };
            for instance in instances {
                match ServiceBinding::from_json(type_name, instance) {
                    Ok(binding) => bindings.push(binding),
                    Err(e) => debug!(
                        service_type = %type_name,
                        error = %e,
                        "Skipping malformed service binding"
                    ),
                }
            }
        }

        debug!(count = bindings.len(), "Loaded service catalog");
        Self { bindings }
    }

    pub fn bindings(&self) -> &[ServiceBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// A binding whose type (label) equals `type_name`
    pub fn has_service(&self, type_name: &str) -> bool {
        self.get_service(type_name).is_some()
    }

    /// A binding carrying a tag that contains `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.get_service_by_tag(tag).is_some()
    }

    /// A binding whose name contains `pattern`
    pub fn has_service_by_name_pattern(&self, pattern: &str) -> bool {
        self.get_service_by_name_pattern(pattern).is_some()
    }

    pub fn get_service(&self, type_name: &str) -> Option<&ServiceBinding> {
        self.bindings
            .iter()
            .find(|b| b.label.eq_ignore_ascii_case(type_name))
    }

    pub fn get_service_by_tag(&self, tag: &str) -> Option<&ServiceBinding> {
        let needle = tag.to_lowercase();
        self.bindings.iter().find(|b| {
            b.tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle))
        })
    }

    pub fn get_service_by_name_pattern(&self, pattern: &str) -> Option<&ServiceBinding> {
        let needle = pattern.to_lowercase();
        self.bindings
            .iter()
            .find(|b| b.name.to_lowercase().contains(&needle))
    }

    /// Resolve a binding for any of `identifiers`.
    ///
    /// Every identifier is first tried as an exact type; only when none
    /// matches exactly are tags and then names searched.
    pub fn find(&self, identifiers: &[&str]) -> Option<&ServiceBinding> {
        identifiers
            .iter()
            .find_map(|id| self.get_service(id))
            .or_else(|| identifiers.iter().find_map(|id| self.get_service_by_tag(id)))
            .or_else(|| {
                identifiers
                    .iter()
                    .find_map(|id| self.get_service_by_name_pattern(id))
            })
    }

    pub fn matches_any(&self, identifiers: &[&str]) -> bool {
        self.find(identifiers).is_some()
    }
}
