use super::{find_file, write_opts};
use crate::context::StagingContext;
use crate::plugin::{version_label, Plugin};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const PRIORITY: u8 = 32;
const OWNER: &str = "jprofiler_profiler";
const DEPENDENCY: &str = "jprofiler-profiler";
const LIBRARY: &str = "libjprofilerti.so";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct JProfilerConfig {
    enabled: bool,
    port: u16,
    nowait: bool,
}

impl Default for JProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8849,
            nowait: true,
        }
    }
}

/// JProfiler native agent, off unless `<PREFIX>_JPROFILER_PROFILER` enables it
pub struct JProfilerProfiler {
    context: Arc<StagingContext>,
}

impl JProfilerProfiler {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn config(&self) -> JProfilerConfig {
        self.context.overrides().decode_or_default("jprofiler_profiler")
    }
}

impl Plugin for JProfilerProfiler {
    fn name(&self) -> &str {
        "JProfiler Profiler"
    }

    fn detect(&self) -> Result<Option<String>> {
        let config = self.config();
        Ok(config
            .enabled
            .then(|| version_label(self.name(), &config.port.to_string())))
    }

    fn install(&self) -> Result<()> {
        let version = self.context.installer().install(
            DEPENDENCY,
            None,
            &self.context.layout().plugin_dir(OWNER),
        )?;
        info!(version = %version, "Installed JProfiler profiler");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let library = find_file(&layout.plugin_dir(OWNER), |name| name == LIBRARY)
            .ok_or_else(|| anyhow!("{} not found in the JProfiler installation", LIBRARY))?;

        let config = self.config();
        let mut options = format!("port={}", config.port);
        if config.nowait {
            options.push_str(",nowait");
        }

        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[format!(
                "-agentpath:{}={}",
                layout.runtime_path(&library),
                options
            )],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{context_with, staged_context};
    use crate::fs::MockFileSystem;
    use crate::installer::MockInstaller;
    use crate::overrides::Overrides;
    use std::fs;
    use tempfile::TempDir;

    fn installer() -> MockInstaller {
        let mut installer = MockInstaller::new();
        installer
            .expect_install()
            .withf(|name, _, _| name == DEPENDENCY)
            .returning(|_, _, dest| {
                let bin = dest.join("jprofiler14.0.5/bin/linux-x64");
                fs::create_dir_all(&bin).unwrap();
                fs::write(bin.join(LIBRARY), "").unwrap();
                Ok("14.0.5".to_string())
            });
        installer
    }

    #[test]
    fn test_disabled_by_default() {
        let context = context_with(MockFileSystem::new(), Overrides::default());
        assert!(JProfilerProfiler::new(context).detect().unwrap().is_none());
    }

    #[test]
    fn test_detect_reports_port() {
        let overrides = Overrides::default().with("jprofiler_profiler", "{enabled: true}");
        let context = context_with(MockFileSystem::new(), overrides);
        assert_eq!(
            JProfilerProfiler::new(context).detect().unwrap().as_deref(),
            Some("JProfiler Profiler=8849")
        );
    }

    #[test]
    fn test_stage_finds_nested_library() {
        let temp = TempDir::new().unwrap();
        let overrides = Overrides::default().with("jprofiler_profiler", "{enabled: true}");
        let context = staged_context(temp.path(), overrides, installer());
        let profiler = JProfilerProfiler::new(Arc::clone(&context));
        profiler.install().unwrap();
        profiler.configure().unwrap();

        let fragments = context.opts().read_fragments().unwrap();
        assert_eq!(fragments[0].file_name(), "32_jprofiler_profiler.opts");
        assert_eq!(
            fragments[0].content,
            "-agentpath:$DEPS_DIR/0/jprofiler_profiler/jprofiler14.0.5/bin/linux-x64/\
             libjprofilerti.so=port=8849,nowait"
        );
    }

    #[test]
    fn test_wait_for_profiler_ui() {
        let temp = TempDir::new().unwrap();
        let overrides = Overrides::default()
            .with("jprofiler_profiler", "{enabled: true, port: 9000, nowait: false}");
        let context = staged_context(temp.path(), overrides, installer());
        let profiler = JProfilerProfiler::new(Arc::clone(&context));
        profiler.install().unwrap();
        profiler.configure().unwrap();

        let fragments = context.opts().read_fragments().unwrap();
        assert!(fragments[0].content.ends_with("libjprofilerti.so=port=9000"));
    }

    #[test]
    fn test_configure_without_library_fails() {
        let temp = TempDir::new().unwrap();
        let context = staged_context(temp.path(), Overrides::default(), MockInstaller::new());
        assert!(JProfilerProfiler::new(context).configure().is_err());
    }
}
