use super::{java_command, top_level_files, write_container_opts, JarManifest};
use crate::context::StagingContext;
use crate::plugin::{Container, Plugin};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct JavaMainConfig {
    #[serde(default)]
    java_main_class: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Plain JVM applications: a class with `main`, named by the override, the
/// application manifest, or an executable jar
pub struct JavaMain {
    context: Arc<StagingContext>,
}

impl JavaMain {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn config(&self) -> JavaMainConfig {
        self.context.overrides().decode_or_default("java_main")
    }

    fn main_class(&self) -> Option<String> {
        self.config()
            .java_main_class
            .filter(|c| !c.trim().is_empty())
            .or_else(|| {
                JarManifest::load(&self.context)
                    .and_then(|m| m.main_class().map(str::to_string))
            })
    }

    fn has_classes(&self) -> bool {
        !top_level_files(&self.context, "class").is_empty()
    }

    /// Application-relative classpath entries: the root, top-level jars, `lib/*.jar`
    fn classpath(&self) -> Vec<String> {
        let mut entries = vec![".".to_string()];
        entries.extend(top_level_files(&self.context, "jar"));
        entries.extend(
            self.context
                .fs()
                .files_with_extension(&self.context.app_path("lib"), "jar")
                .into_iter()
                .map(|jar| format!("lib/{}", jar)),
        );
        entries
    }

    fn with_arguments(&self, command: String) -> String {
        match self.config().arguments {
            Some(args) if !args.trim().is_empty() => format!("{} {}", command, args.trim()),
            _ => command,
        }
    }
}

impl Plugin for JavaMain {
    fn name(&self) -> &str {
        "Java Main"
    }

    fn detect(&self) -> Result<Option<String>> {
        if let Some(class) = self.main_class() {
            debug!(main_class = %class, "Found main class");
            return Ok(Some(self.name().to_string()));
        }
        let found = !top_level_files(&self.context, "jar").is_empty() || self.has_classes();
        Ok(found.then(|| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        self.context
            .layout()
            .write_env_file("CLASSPATH", &self.classpath().join(":"))
            .context("Failed to write CLASSPATH")?;
        write_container_opts(&self.context, &[])
    }
}

impl Container for JavaMain {
    fn command(&self) -> Result<String> {
        if let Some(class) = self.main_class() {
            let classpath: Vec<String> = self
                .classpath()
                .into_iter()
                .map(|entry| format!("$PWD/{}", entry))
                .collect();
            let args = format!("-cp {} {}", classpath.join(":"), class);
            return Ok(self.with_arguments(java_command(&args)));
        }

        match top_level_files(&self.context, "jar").first() {
            Some(jar) => Ok(self.with_arguments(java_command(&format!("-jar {}", jar)))),
            None => bail!("No main class configured and no executable jar found"),
        }
    }
}
