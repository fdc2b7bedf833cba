use super::write_opts;
use crate::context::StagingContext;
use crate::jres;
use crate::plugin::{version_label, Plugin};
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

const PRIORITY: u8 = 20;
const OWNER: &str = "debug";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DebugConfig {
    enabled: bool,
    port: u16,
    suspend: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8000,
            suspend: false,
        }
    }
}

/// JDWP remote debugging, off unless `<PREFIX>_DEBUG` enables it
pub struct JavaDebug {
    context: Arc<StagingContext>,
}

impl JavaDebug {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn config(&self) -> DebugConfig {
        self.context.overrides().decode_or_default("debug")
    }
}

impl Plugin for JavaDebug {
    fn name(&self) -> &str {
        "Debug"
    }

    fn detect(&self) -> Result<Option<String>> {
        let config = self.config();
        Ok(config
            .enabled
            .then(|| version_label(self.name(), &config.port.to_string())))
    }

    fn install(&self) -> Result<()> {
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let config = self.config();
        // Java 9 binds JDWP to localhost unless the host is given explicitly
        let address = if jres::installed_major_version(self.context.layout()) >= 9 {
            format!("*:{}", config.port)
        } else {
            config.port.to_string()
        };
        let suspend = if config.suspend { "y" } else { "n" };

        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[format!(
                "-agentlib:jdwp=transport=dt_socket,server=y,address={},suspend={}",
                address, suspend
            )],
        )
    }
}
