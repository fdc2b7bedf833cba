use super::write_container_opts;
use crate::context::StagingContext;
use crate::plugin::{Container, Plugin};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

/// Distributions produced by Gradle's `distZip` and similar tasks: start
/// scripts in `bin/`, jars in `lib/`
pub struct DistZip {
    context: Arc<StagingContext>,
}

impl DistZip {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    /// Unix start scripts, sorted by name
    fn start_scripts(&self) -> Vec<String> {
        let fs = self.context.fs();
        if !fs.is_dir(&self.context.app_path("lib")) {
            return Vec::new();
        }
        fs.read_dir(&self.context.app_path("bin"))
            .map(|entries| {
                entries
                    .into_iter()
                    .filter(|e| e.is_file() && !e.name.ends_with(".bat"))
                    .map(|e| e.name)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Plugin for DistZip {
    fn name(&self) -> &str {
        "Dist ZIP"
    }

    fn detect(&self) -> Result<Option<String>> {
        Ok((!self.start_scripts().is_empty()).then(|| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        #[cfg(unix)]
        {
            use anyhow::Context;
            use std::os::unix::fs::PermissionsExt;

            for script in self.start_scripts() {
                let path = self.context.app_path("bin").join(&script);
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                    .with_context(|| format!("Failed to make {} executable", path.display()))?;
                debug!(script = %script, "Marked start script executable");
            }
        }
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        write_container_opts(&self.context, &[])
    }
}

impl Container for DistZip {
    fn command(&self) -> Result<String> {
        match self.start_scripts().first() {
            Some(script) => Ok(format!("exec $HOME/bin/{}", script)),
            None => bail!("No start script found in bin/"),
        }
    }
}
