use super::{find_file, write_opts};
use crate::context::StagingContext;
use crate::plugin::Plugin;
use crate::services::ServiceBinding;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;

const PRIORITY: u8 = 23;
const OWNER: &str = "introscope_agent";
const DEPENDENCY: &str = "introscope-agent";
const SERVICE_IDS: &[&str] = &["introscope", "ca-apm", "ca-wily"];
const PROFILE: &str = "-Dcom.wily.introscope.agentProfile.agent";

/// CA APM Introscope Java agent, enabled by a bound Introscope service
pub struct IntroscopeAgent {
    context: Arc<StagingContext>,
}

impl IntroscopeAgent {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn binding(&self) -> Option<&ServiceBinding> {
        self.context.services().find(SERVICE_IDS)
    }
}

impl Plugin for IntroscopeAgent {
    fn name(&self) -> &str {
        "Introscope Agent"
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
        info!(version = %version, "Installed Introscope agent");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let binding = self
            .binding()
            .ok_or_else(|| anyhow!("Introscope service binding disappeared"))?;
        let agent = find_file(&layout.plugin_dir(OWNER), |name| name == "Agent.jar")
            .ok_or_else(|| anyhow!("Agent.jar not found in the Introscope installation"))?;

        let agent_name = binding
            .credential(&["agent_name", "agentName"])
            .unwrap_or_else(|| self.context.application_name());

        let mut opts = vec![
            format!("-javaagent:{}", layout.runtime_path(&agent)),
            format!("{}.name={}", PROFILE, agent_name),
        ];
        if let Some(host) = binding.credential(&["em_host", "emHost"]) {
            opts.push(format!("{}.enterpriseManager.host={}", PROFILE, host));
        }
        if let Some(port) = binding.credential(&["em_port", "emPort"]) {
            opts.push(format!("{}.enterpriseManager.port={}", PROFILE, port));
        }

        write_opts(&self.context, PRIORITY, OWNER, &opts)
    }
}
