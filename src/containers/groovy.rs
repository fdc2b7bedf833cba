use super::{top_level_files, write_container_opts};
use crate::context::StagingContext;
use crate::layout::find_home;
use crate::overrides::VersionSpec;
use crate::plugin::{Container, Plugin};
use anyhow::{anyhow, bail, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEPENDENCY: &str = "groovy";

#[derive(Debug, Default, Deserialize)]
struct GroovyConfig {
    #[serde(default)]
    groovy: VersionSpec,
}

/// Loose Groovy scripts run by an installed Groovy distribution
pub struct Groovy {
    context: Arc<StagingContext>,
}

impl Groovy {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn scripts(&self) -> Vec<String> {
        top_level_files(&self.context, "groovy")
    }

    fn is_entry_point(&self, script: &str, main_re: &Regex) -> bool {
        self.context
            .fs()
            .read_to_string(&self.context.app_path(script))
            .map(|content| content.starts_with("#!") || main_re.is_match(&content))
            .unwrap_or(false)
    }

    /// The script to run: the single one with a `main` method or shebang,
    /// or the only script present
    fn main_script(&self) -> Result<String> {
        let scripts = self.scripts();
        let main_re = Regex::new(r"static\s+void\s+main\s*\(").expect("valid regex");
        let mut entry_points: Vec<&String> = scripts
            .iter()
            .filter(|s| self.is_entry_point(s, &main_re))
            .collect();

        match (entry_points.len(), scripts.len()) {
            (1, _) => Ok(entry_points.remove(0).clone()),
            (0, 1) => Ok(scripts[0].clone()),
            (0, 0) => bail!("No Groovy scripts found"),
            _ => bail!(
                "Cannot choose a main script among {}",
                scripts.join(", ")
            ),
        }
    }

    fn install_dir(&self) -> PathBuf {
        self.context.layout().plugin_dir(DEPENDENCY)
    }
}

impl Plugin for Groovy {
    fn name(&self) -> &str {
        "Groovy"
    }

    fn detect(&self) -> Result<Option<String>> {
        Ok((!self.scripts().is_empty()).then(|| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        let config: GroovyConfig = self.context.overrides().decode_or_default("groovy");
        let version = self.context.installer().install(
            DEPENDENCY,
            config.groovy.hint().as_deref(),
            &self.install_dir(),
        )?;
        info!(version = %version, "Installed Groovy");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        write_container_opts(&self.context, &[])
    }
}

impl Container for Groovy {
    fn command(&self) -> Result<String> {
        let script = self.main_script()?;
        let dir = self.install_dir();
        let home = find_home(&dir, &["groovy"], "bin/groovy")
            .ok_or_else(|| anyhow!("No Groovy installation found under {}", dir.display()))?;
        Ok(format!(
            "exec {}/bin/groovy {}",
            self.context.layout().runtime_path(&home),
            script
        ))
    }
}
