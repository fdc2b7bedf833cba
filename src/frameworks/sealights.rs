use super::{find_file, write_opts};
use crate::context::StagingContext;
use crate::plugin::Plugin;
use crate::services::ServiceBinding;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

const PRIORITY: u8 = 25;
const OWNER: &str = "sealights_agent";
const DEPENDENCY: &str = "sealights-agent";
const AGENT_JAR: &str = "sl-test-listener.jar";

/// Sealights test listener agent, enabled by a bound Sealights service
pub struct SealightsAgent {
    context: Arc<StagingContext>,
}

impl SealightsAgent {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn binding(&self) -> Option<&ServiceBinding> {
        self.context.services().find(&["sealights"])
    }
}

impl Plugin for SealightsAgent {
    fn name(&self) -> &str {
        "Sealights Agent"
    }

    fn detect(&self) -> Result<Option<String>> {
        Ok(self.binding().map(|_| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        let version = self.context.installer().install(
            DEPENDENCY,
            None,
            &self.context.layout().plugin_dir(OWNER),
        )?;
        info!(version = %version, "Installed Sealights agent");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let binding = self
            .binding()
            .ok_or_else(|| anyhow!("Sealights service binding disappeared"))?;
        let token = binding
            .credential(&["token"])
            .ok_or_else(|| anyhow!("Sealights service has no 'token' credential"))?;

        let install_dir = layout.plugin_dir(OWNER);
        let agent = find_file(&install_dir, |name| name == AGENT_JAR)
            .or_else(|| {
                warn!("{} not found, falling back to any sl-*.jar", AGENT_JAR);
                find_file(&install_dir, |name| name.starts_with("sl-") && name.ends_with(".jar"))
            })
            .ok_or_else(|| anyhow!("No Sealights agent jar in {}", install_dir.display()))?;

        let log_dir = layout.dep_dir().join("sealights_logs");
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create {}", log_dir.display()))?;

        let mut opts = vec![
            format!("-javaagent:{}", layout.runtime_path(&agent)),
            format!("-Dsl.token={}", token),
        ];
        for (credential, property) in [
            ("tags", "sl.tags"),
            ("enableUpgrade", "sl.enableUpgrade"),
            ("logLevel", "sl.log.level"),
        ] {
            if let Some(value) = binding.credential(&[credential]) {
                opts.push(format!("-D{}={}", property, value));
            }
        }
        opts.push(format!("-Dsl.log.folder={}", layout.runtime_path(&log_dir)));

        write_opts(&self.context, PRIORITY, OWNER, &opts)
    }
}
