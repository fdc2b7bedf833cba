use super::write_opts;
use crate::context::StagingContext;
use crate::plugin::Plugin;
use crate::services::ServiceBinding;
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::sync::Arc;
use tracing::info;

const PRIORITY: u8 = 27;
const OWNER: &str = "takipi_agent";
const DEPENDENCY: &str = "takipi";
const SERVICE_IDS: &[&str] = &["takipi", "overops"];

/// Takipi (OverOps) native agent, enabled by a bound Takipi or OverOps service
pub struct TakipiAgent {
    context: Arc<StagingContext>,
}

impl TakipiAgent {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn binding(&self) -> Option<&ServiceBinding> {
        self.context.services().find(SERVICE_IDS)
    }

    fn profile_script(&self, home: &str) -> String {
        let mut script = format!(
            "export TAKIPI_HOME={home}\n\
             export LD_LIBRARY_PATH=\"$LD_LIBRARY_PATH:{home}/lib\"\n\
             export TAKIPI_MACHINE_NAME=\"node-$CF_INSTANCE_INDEX\"\n"
        );
        if let Some(binding) = self.binding() {
            for (credential, variable) in [
                ("collector_host", "TAKIPI_COLLECTOR_HOST"),
                ("collector_port", "TAKIPI_COLLECTOR_PORT"),
                ("secret_key", "TAKIPI_SECRET_KEY"),
            ] {
                if let Some(value) = binding.credential(&[credential]) {
                    let _ = writeln!(script, "export {}=\"{}\"", variable, value);
                }
            }
        }
        script
    }
}

impl Plugin for TakipiAgent {
    fn name(&self) -> &str {
        "Takipi Agent"
    }

    fn detect(&self) -> Result<Option<String>> {
        Ok(self.binding().map(|_| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        let install_dir = self.context.layout().plugin_dir(OWNER);
        let version = self
            .context
            .installer()
            .install(DEPENDENCY, None, &install_dir)?;

        let log_dir = install_dir.join("log/agents");
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create {}", log_dir.display()))?;
        info!(version = %version, "Installed Takipi agent");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let install_dir = layout.plugin_dir(OWNER);
        let library = install_dir.join("lib/libTakipiAgent.so");
        if !library.is_file() {
            bail!("Takipi agent not found at {}", library.display());
        }

        let home = layout.runtime_path(&install_dir);
        layout
            .write_profile_d("takipi.sh", &self.profile_script(&home))
            .context("Failed to write profile.d/takipi.sh")?;

        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[
                format!("-agentpath:{}", layout.runtime_path(&library)),
                format!("-Dtakipi.name={}", self.context.application_name()),
                "-Xshare:off".to_string(),
                "-XX:-UseTypeSpeculation".to_string(),
            ],
        )
    }
}
