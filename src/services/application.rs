use serde::Deserialize;
use tracing::debug;

/// Application identity supplied by the platform, used by plugins for labelling
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationMetadata {
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub application_version: Option<String>,
    #[serde(default)]
    pub space_name: Option<String>,
}

impl ApplicationMetadata {
    /// Parse the raw metadata value; absent or malformed input yields empty metadata
    pub fn from_env_value(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Self::default();
        };

        serde_json::from_str(raw).unwrap_or_else(|e| {
            debug!(error = %e, "Ignoring malformed application metadata");
            Self::default()
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.application_name.as_deref().or(self.name.as_deref())
    }

    pub fn version(&self) -> Option<&str> {
        self.application_version.as_deref()
    }
}
