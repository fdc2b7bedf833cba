use super::{find_file, write_opts};
use crate::context::StagingContext;
use crate::plugin::{version_label, Plugin};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracing::info;

const PRIORITY: u8 = 34;
const OWNER: &str = "your_kit_profiler";
const DEPENDENCY: &str = "your-kit-profiler";
const LIBRARY: &str = "libyjpagent.so";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct YourKitConfig {
    enabled: bool,
    port: u16,
    default_session_name: Option<String>,
}

impl Default for YourKitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 10001,
            default_session_name: None,
        }
    }
}

/// YourKit native agent, off unless `<PREFIX>_YOUR_KIT_PROFILER` enables it
pub struct YourKitProfiler {
    context: Arc<StagingContext>,
}

impl YourKitProfiler {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn config(&self) -> YourKitConfig {
        self.context.overrides().decode_or_default("your_kit_profiler")
    }

    /// `<space>:<application>` unless the override names the session
    fn session_name(&self, config: &YourKitConfig) -> String {
        if let Some(name) = &config.default_session_name {
            return name.clone();
        }
        let application = self.context.application_name();
        match self.context.application().space_name.as_deref() {
            Some(space) => format!("{}:{}", space, application),
            None => application,
        }
    }
}

impl Plugin for YourKitProfiler {
    fn name(&self) -> &str {
        "YourKit Profiler"
    }

    fn detect(&self) -> Result<Option<String>> {
        let config = self.config();
        Ok(config
            .enabled
            .then(|| version_label(self.name(), &config.port.to_string())))
    }

    fn install(&self) -> Result<()> {
        let version = self.context.installer().install(
            DEPENDENCY,
            None,
            &self.context.layout().plugin_dir(OWNER),
        )?;
        info!(version = %version, "Installed YourKit profiler");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let install_dir = layout.plugin_dir(OWNER);
        let library = find_file(&install_dir, |name| name == LIBRARY)
            .ok_or_else(|| anyhow!("{} not found in the YourKit installation", LIBRARY))?;

        // Snapshots and logs
        let home = install_dir.join("home");
        fs::create_dir_all(&home)
            .with_context(|| format!("Failed to create {}", home.display()))?;
        let home = layout.runtime_path(&home);

        let config = self.config();
        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[format!(
                "-agentpath:{}=dir={},logdir={},port={},sessionname={}",
                layout.runtime_path(&library),
                home,
                home,
                config.port,
                self.session_name(&config)
            )],
        )
    }
}
