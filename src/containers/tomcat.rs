use super::{top_level_files, write_container_opts};
use crate::context::StagingContext;
use crate::layout::find_home;
use crate::overrides::VersionSpec;
use crate::plugin::{Container, Plugin};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const DEPENDENCY: &str = "tomcat";
const HOME_PREFIXES: &[&str] = &["apache-tomcat", "tomcat"];
const LAUNCHER: &str = "bin/catalina.sh";

#[derive(Debug, Default, Deserialize)]
struct TomcatConfig {
    #[serde(default)]
    tomcat: VersionSpec,
}

/// Servlet applications, exploded (`WEB-INF/`) or as a top-level war,
/// served from the application directory by an installed Tomcat
pub struct Tomcat {
    context: Arc<StagingContext>,
}

impl Tomcat {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn war(&self) -> Option<String> {
        top_level_files(&self.context, "war").into_iter().next()
    }

    fn install_dir(&self) -> PathBuf {
        self.context.layout().plugin_dir(DEPENDENCY)
    }

    fn home(&self) -> Result<PathBuf> {
        let dir = self.install_dir();
        find_home(&dir, HOME_PREFIXES, LAUNCHER)
            .ok_or_else(|| anyhow!("No Tomcat installation found under {}", dir.display()))
    }

    /// Context descriptor that deploys the application at `/`
    fn root_context(&self) -> String {
        let doc_base = match self.war() {
            Some(war) if !self.is_exploded() => format!("${{app.root}}/{}", war),
            _ => "${app.root}".to_string(),
        };
        format!(
            "<?xml version='1.0' encoding='utf-8'?>\n<Context docBase=\"{}\" reloadable=\"false\"/>\n",
            doc_base
        )
    }

    fn is_exploded(&self) -> bool {
        self.context.fs().is_dir(&self.context.app_path("WEB-INF"))
    }
}

impl Plugin for Tomcat {
    fn name(&self) -> &str {
        "Tomcat"
    }

    fn detect(&self) -> Result<Option<String>> {
        if self.is_exploded() || self.war().is_some() {
            return Ok(Some(self.name().to_string()));
        }
        Ok(None)
    }

    fn install(&self) -> Result<()> {
        let config: TomcatConfig = self.context.overrides().decode_or_default("tomcat");
        let hint = config.tomcat.hint();
        let version = self
            .context
            .installer()
            .install(DEPENDENCY, hint.as_deref(), &self.install_dir())?;
        info!(version = %version, "Installed Tomcat");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let home = self.home()?;
        let descriptor = home.join("conf/Catalina/localhost/ROOT.xml");
        if let Some(parent) = descriptor.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&descriptor, self.root_context())
            .with_context(|| format!("Failed to write {}", descriptor.display()))?;
        debug!(file = %descriptor.display(), "Wrote root context");

        write_container_opts(
            &self.context,
            &["-Dapp.root=$HOME".to_string(), "-Dhttp.port=$PORT".to_string()],
        )
    }
}

impl Container for Tomcat {
    fn command(&self) -> Result<String> {
        let home = self.home()?;
        Ok(format!(
            "exec {}/{} run",
            self.context.layout().runtime_path(&home),
            LAUNCHER
        ))
    }
}
