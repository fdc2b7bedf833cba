use super::{find_file, write_opts};
use crate::context::StagingContext;
use crate::plugin::Plugin;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const PRIORITY: u8 = 31;
const OWNER: &str = "jrebel_agent";
const DEPENDENCY: &str = "jrebel";
const AGENT_LIBRARY: &str = "libjrebel64.so";

/// Where a JRebel-enabled build leaves its remoting descriptor
const REMOTE_DESCRIPTORS: &[&str] = &[
    "rebel-remote.xml",
    "WEB-INF/classes/rebel-remote.xml",
    "BOOT-INF/classes/rebel-remote.xml",
];

#[derive(Debug, Deserialize)]
#[serde(default)]
struct JRebelConfig {
    enabled: bool,
}

impl Default for JRebelConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// JRebel remoting agent for applications built with a `rebel-remote.xml`
pub struct JRebelAgent {
    context: Arc<StagingContext>,
}

impl JRebelAgent {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn has_remote_descriptor(&self) -> bool {
        REMOTE_DESCRIPTORS
            .iter()
            .any(|path| self.context.fs().is_file(&self.context.app_path(path)))
    }
}

impl Plugin for JRebelAgent {
    fn name(&self) -> &str {
        "JRebel Agent"
    }

    fn detect(&self) -> Result<Option<String>> {
        let config: JRebelConfig = self.context.overrides().decode_or_default("jrebel_agent");
        let active = config.enabled && self.has_remote_descriptor();
        Ok(active.then(|| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        let version = self.context.installer().install(
            DEPENDENCY,
            None,
            &self.context.layout().plugin_dir(OWNER),
        )?;
        info!(version = %version, "Installed JRebel agent");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let library = find_file(&layout.plugin_dir(OWNER), |name| name == AGENT_LIBRARY)
            .ok_or_else(|| anyhow!("{} not found in the JRebel installation", AGENT_LIBRARY))?;

        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[
                format!("-agentpath:{}", layout.runtime_path(&library)),
                "-Drebel.remoting_plugin=true".to_string(),
                "-Drebel.cloud.platform=cloudfoundry".to_string(),
            ],
        )
    }
}
