use crate::context::StagingContext;
use crate::opts::{USER_OWNER, USER_PRIORITY};
use crate::plugin::Plugin;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config/java_opts.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OptsValue {
    List(Vec<String>),
    Line(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct JavaOptsConfig {
    from_environment: bool,
    java_opts: Option<OptsValue>,
}

impl Default for JavaOptsConfig {
    fn default() -> Self {
        Self {
            from_environment: true,
            java_opts: None,
        }
    }
}

impl JavaOptsConfig {
    fn opts(&self) -> Vec<String> {
        match &self.java_opts {
            Some(OptsValue::List(list)) => list
                .iter()
                .map(|opt| opt.trim().to_string())
                .filter(|opt| !opt.is_empty())
                .collect(),
            Some(OptsValue::Line(line)) => line.split_whitespace().map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    /// Fragment text; the environment's `JAVA_OPTS` goes first so the
    /// configured options can override it
    fn fragment(&self) -> String {
        let mut parts = Vec::new();
        if self.from_environment {
            parts.push("$JAVA_OPTS".to_string());
        }
        parts.extend(self.opts());
        parts.join(" ")
    }
}

/// Operator-supplied options, written to the reserved last slot so they
/// win over everything the other plugins contribute
pub struct JavaOpts {
    context: Arc<StagingContext>,
}

impl JavaOpts {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    /// The override variable wins over the application's config file
    fn config(&self) -> JavaOptsConfig {
        let overrides = self.context.overrides();
        if overrides.is_set("java_opts") {
            return overrides.decode_or_default("java_opts");
        }

        let path = self.context.app_path(CONFIG_FILE);
        let Ok(content) = self.context.fs().read_to_string(&path) else {
            return JavaOptsConfig::default();
        };
        debug!(file = %path.display(), "Reading JAVA_OPTS configuration");
        serde_yaml::from_str::<Option<JavaOptsConfig>>(&content)
            .map(Option::unwrap_or_default)
            .unwrap_or_else(|e| {
                warn!(file = %path.display(), error = %e, "Ignoring malformed JAVA_OPTS configuration");
                JavaOptsConfig::default()
            })
    }
}

impl Plugin for JavaOpts {
    fn name(&self) -> &str {
        "Java Opts"
    }

    fn detect(&self) -> Result<Option<String>> {
        let config = self.config();
        let active = config.from_environment || !config.opts().is_empty();
        Ok(active.then(|| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let fragment = self.config().fragment();
        if fragment.is_empty() {
            return Ok(());
        }
        self.context
            .opts()
            .write_fragment(USER_PRIORITY, USER_OWNER, &fragment)
            .context("Failed to write user JAVA_OPTS")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{context_with, staged_context};
    use crate::fs::MockFileSystem;
    use crate::installer::MockInstaller;
    use crate::overrides::Overrides;
    use tempfile::TempDir;
    use yare::parameterized;

    fn fragment_for(fs: MockFileSystem, overrides: Overrides) -> String {
        JavaOpts::new(context_with(fs, overrides)).config().fragment()
    }

    #[parameterized(
        default_passes_environment_through = { None, "$JAVA_OPTS" },
        list = { Some("{java_opts: [-Xss512k, -Dfoo=bar]}"), "$JAVA_OPTS -Xss512k -Dfoo=bar" },
        line = { Some("{java_opts: '-Xss512k  -Dfoo=bar'}"), "$JAVA_OPTS -Xss512k -Dfoo=bar" },
        without_environment = { Some("{from_environment: false, java_opts: [-Xss512k]}"), "-Xss512k" },
        legacy_list_form = { Some("[from_environment: false, java_opts: -Xmx1g]"), "-Xmx1g" },
        nothing = { Some("{from_environment: false}"), "" },
    )]
    fn test_fragment_from_override(raw: Option<&str>, expected: &str) {
        let overrides = match raw {
            Some(raw) => Overrides::default().with("java_opts", raw),
            None => Overrides::default(),
        };
        assert_eq!(fragment_for(MockFileSystem::new(), overrides), expected);
    }

    #[test]
    fn test_config_file() {
        let fs = MockFileSystem::new();
        fs.add_file(
            CONFIG_FILE,
            "from_environment: false\njava_opts:\n  - -Dapp.mode=batch\n",
        );
        assert_eq!(fragment_for(fs, Overrides::default()), "-Dapp.mode=batch");
    }

    #[test]
    fn test_override_beats_config_file() {
        let fs = MockFileSystem::new();
        fs.add_file(CONFIG_FILE, "java_opts: [-Dfrom=file]\n");
        let overrides = Overrides::default().with("java_opts", "{java_opts: [-Dfrom=env]}");
        assert_eq!(fragment_for(fs, overrides), "$JAVA_OPTS -Dfrom=env");
    }

    #[test]
    fn test_malformed_config_file_falls_back() {
        let fs = MockFileSystem::new();
        fs.add_file(CONFIG_FILE, "java_opts: [unterminated\n");
        assert_eq!(fragment_for(fs, Overrides::default()), "$JAVA_OPTS");
    }

    #[test]
    fn test_configure_writes_reserved_slot() {
        let temp = TempDir::new().unwrap();
        let overrides = Overrides::default().with("java_opts", "{java_opts: [-Xmx1g]}");
        let context = staged_context(temp.path(), overrides, MockInstaller::new());

        JavaOpts::new(Arc::clone(&context)).configure().unwrap();

        let fragments = context.opts().read_fragments().unwrap();
        assert_eq!(fragments[0].file_name(), "99_user_java_opts.opts");
        assert_eq!(fragments[0].content, "$JAVA_OPTS -Xmx1g");
    }

    #[test]
    fn test_configure_skips_empty_fragment() {
        let temp = TempDir::new().unwrap();
        let overrides = Overrides::default().with("java_opts", "{from_environment: false}");
        let context = staged_context(temp.path(), overrides, MockInstaller::new());

        JavaOpts::new(Arc::clone(&context)).configure().unwrap();
        assert!(context.opts().read_fragments().unwrap().is_empty());
    }

    #[test]
    fn test_detect() {
        let context = context_with(
            MockFileSystem::new(),
            Overrides::default().with("java_opts", "{from_environment: false}"),
        );
        assert!(JavaOpts::new(context).detect().unwrap().is_none());
    }
}
