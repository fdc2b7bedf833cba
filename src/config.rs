//! Process configuration for javastage
//!
//! Settings are read from the environment exactly once, in the binary. The
//! library never calls `std::env` on its own; plugins see a frozen
//! [`EnvSnapshot`] through their [`StagingContext`](crate::context::StagingContext).
//!
//! # Environment Variables
//!
//! - `JAVASTAGE_BUILDPACK_DIR`: root holding `manifest.yml` and the offline
//!   dependency cache - default: the parent of the directory holding the executable
//! - `JAVASTAGE_OVERRIDE_PREFIX`: prefix of plugin override variables - default: "JBP_CONFIG"
//! - `JAVASTAGE_LOG_LEVEL`: logging level - default: "info"
//! - `JAVASTAGE_LOG_JSON`: JSON log lines (true|false) - default: "false"
//! - `VCAP_SERVICES`, `VCAP_APPLICATION`: platform-provided catalog and metadata

use crate::overrides::{Overrides, DEFAULT_PREFIX};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
pub const MANIFEST_FILE: &str = "manifest.yml";
pub const VCAP_SERVICES: &str = "VCAP_SERVICES";
pub const VCAP_APPLICATION: &str = "VCAP_APPLICATION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Dependency manifest not found at {0}. Set JAVASTAGE_BUILDPACK_DIR")]
    MissingManifest(PathBuf),

    #[error("Staging directory {0} does not exist")]
    MissingBuildDir(PathBuf),
}

#[derive(Debug, Clone)]
pub struct StagingConfig {
    pub buildpack_dir: PathBuf,

    pub override_prefix: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_json: bool,
}

impl Default for StagingConfig {
    /// Loads from `JAVASTAGE_*` variables, falling back to defaults
    fn default() -> Self {
        let buildpack_dir = env::var("JAVASTAGE_BUILDPACK_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_buildpack_dir);

        let override_prefix = env::var("JAVASTAGE_OVERRIDE_PREFIX")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let log_level = env::var("JAVASTAGE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_json = env::var("JAVASTAGE_LOG_JSON")
            .ok()
            .and_then(|v| v.to_lowercase().parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            buildpack_dir,
            override_prefix,
            log_level,
            log_json,
        }
    }
}

/// `<buildpack>/bin/javastage` -> `<buildpack>`
fn default_buildpack_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl StagingConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self
            .override_prefix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid override prefix: {}. Use upper-case letters, digits and '_'",
                self.override_prefix
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.buildpack_dir.join(MANIFEST_FILE)
    }

    /// Supplying dependencies needs the manifest; detection and release do not
    pub fn require_manifest(&self) -> Result<PathBuf, ConfigError> {
        let path = self.manifest_path();
        if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::MissingManifest(path))
        }
    }
}

impl fmt::Display for StagingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "javastage configuration:")?;
        writeln!(f, "  Buildpack Dir: {}", self.buildpack_dir.display())?;
        writeln!(f, "  Override Prefix: {}", self.override_prefix)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Log JSON: {}", self.log_json)?;
        Ok(())
    }
}

/// The slice of the process environment a staging run is allowed to see
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub vcap_services: Option<String>,
    pub vcap_application: Option<String>,
    overrides: Overrides,
}

impl EnvSnapshot {
    pub fn capture(prefix: &str) -> Self {
        Self::from_vars(prefix, env::vars())
    }

    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let lookup = |key: &str| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            vcap_services: lookup(VCAP_SERVICES),
            vcap_application: lookup(VCAP_APPLICATION),
            overrides: Overrides::from_vars(prefix, vars.iter().cloned()),
        }
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("JAVASTAGE_OVERRIDE_PREFIX"),
            EnvGuard::unset("JAVASTAGE_LOG_LEVEL"),
            EnvGuard::unset("JAVASTAGE_LOG_JSON"),
            EnvGuard::set("JAVASTAGE_BUILDPACK_DIR", "/buildpack"),
        ];

        let config = StagingConfig::default();

        assert_eq!(config.buildpack_dir, PathBuf::from("/buildpack"));
        assert_eq!(config.override_prefix, DEFAULT_PREFIX);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(!config.log_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("JAVASTAGE_OVERRIDE_PREFIX", "MY_CONFIG"),
            EnvGuard::set("JAVASTAGE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("JAVASTAGE_LOG_JSON", "true"),
        ];

        let config = StagingConfig::from_env();

        assert_eq!(config.override_prefix, "MY_CONFIG");
        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);
    }

    #[test]
    fn test_validation_rejects_bad_prefix() {
        let config = StagingConfig {
            buildpack_dir: PathBuf::from("/bp"),
            override_prefix: "jbp-config".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let config = StagingConfig {
            buildpack_dir: PathBuf::from("/bp"),
            override_prefix: DEFAULT_PREFIX.to_string(),
            log_level: "verbose".to_string(),
            log_json: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = StagingConfig {
            buildpack_dir: temp.path().to_path_buf(),
            override_prefix: DEFAULT_PREFIX.to_string(),
            log_level: "info".to_string(),
            log_json: false,
        };

        assert!(matches!(
            config.require_manifest(),
            Err(ConfigError::MissingManifest(_))
        ));

        std::fs::write(temp.path().join(MANIFEST_FILE), "dependencies: []\n").unwrap();
        assert_eq!(config.require_manifest().unwrap(), temp.path().join(MANIFEST_FILE));
    }

    #[test]
    fn test_config_display() {
        let config = StagingConfig {
            buildpack_dir: PathBuf::from("/bp"),
            override_prefix: DEFAULT_PREFIX.to_string(),
            log_level: "info".to_string(),
            log_json: false,
        };
        let display = config.to_string();
        assert!(display.contains("Buildpack Dir: /bp"));
        assert!(display.contains("Override Prefix: JBP_CONFIG"));
    }

    #[test]
    fn test_env_snapshot_keeps_only_relevant_variables() {
        let snapshot = EnvSnapshot::from_vars(
            "JBP_CONFIG",
            vec![
                ("VCAP_SERVICES".to_string(), "{}".to_string()),
                ("VCAP_APPLICATION".to_string(), "  ".to_string()),
                ("JBP_CONFIG_JMX".to_string(), "{enabled: true}".to_string()),
                ("AWS_SECRET".to_string(), "hidden".to_string()),
            ],
        );

        assert_eq!(snapshot.vcap_services.as_deref(), Some("{}"));
        assert!(snapshot.vcap_application.is_none());
        assert!(snapshot.overrides().is_set("jmx"));
        assert_eq!(snapshot.overrides().prefix(), "JBP_CONFIG");
    }
}
