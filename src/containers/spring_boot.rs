use super::{java_command, top_level_files, write_container_opts, JarManifest};
use crate::context::StagingContext;
use crate::plugin::{version_label, Container, Plugin};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_LAUNCHER: &str = "org.springframework.boot.loader.JarLauncher";

/// Spring Boot fat jars, packaged or exploded
pub struct SpringBoot {
    context: Arc<StagingContext>,
}

impl SpringBoot {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn exploded(&self, manifest: Option<&JarManifest>) -> bool {
        self.context
            .fs()
            .is_dir(&self.context.app_path("BOOT-INF"))
            || manifest.is_some_and(|m| m.get("Spring-Boot-Version").is_some())
    }

    /// A top-level jar whose name marks it as a Boot jar
    fn boot_jar(&self) -> Option<String> {
        top_level_files(&self.context, "jar").into_iter().find(|name| {
            let lower = name.to_lowercase();
            lower.contains("spring") || lower.contains("boot")
        })
    }
}

impl Plugin for SpringBoot {
    fn name(&self) -> &str {
        "Spring Boot"
    }

    fn detect(&self) -> Result<Option<String>> {
        let manifest = JarManifest::load(&self.context);
        if self.exploded(manifest.as_ref()) {
            let version = manifest
                .as_ref()
                .and_then(|m| m.get("Spring-Boot-Version"))
                .unwrap_or_default();
            return Ok(Some(version_label(self.name(), version)));
        }

        if let Some(jar) = self.boot_jar() {
            debug!(jar = %jar, "Found Spring Boot jar");
            return Ok(Some(self.name().to_string()));
        }

        Ok(None)
    }

    fn install(&self) -> Result<()> {
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        write_container_opts(&self.context, &[])
    }
}

impl Container for SpringBoot {
    fn command(&self) -> Result<String> {
        let manifest = JarManifest::load(&self.context);
        if self.exploded(manifest.as_ref()) {
            let launcher = manifest
                .as_ref()
                .and_then(JarManifest::main_class)
                .filter(|class| class.contains("springframework.boot.loader"))
                .unwrap_or(DEFAULT_LAUNCHER);
            return Ok(java_command(&format!("-cp $PWD/. {}", launcher)));
        }

        match self.boot_jar() {
            Some(jar) => Ok(java_command(&format!("-jar {}", jar))),
            None => bail!("No Spring Boot jar or BOOT-INF directory found"),
        }
    }
}
