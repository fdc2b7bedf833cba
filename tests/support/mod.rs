//! Shared fixtures for the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use javastage::context::StagingContext;
use javastage::installer::{InstallError, Installer};
use javastage::layout::StagingLayout;
use javastage::plugin::{Container, Jre, Plugin};
use javastage::progress::{ProgressEvent, ProgressHandler};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A throwaway staging tree: `app/`, `cache/`, `deps/` with index 0
pub struct StagingDirs {
    pub temp: TempDir,
    pub layout: StagingLayout,
}

impl StagingDirs {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let layout = StagingLayout::new(
            temp.path().join("app"),
            temp.path().join("cache"),
            temp.path().join("deps"),
            "0",
        );
        fs::create_dir_all(&layout.build_dir).expect("Failed to create app dir");
        Self { temp, layout }
    }

    /// Write `content` to `relative` inside the application
    pub fn app_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.layout.build_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write app file");
        path
    }

    pub fn fragment_files(&self) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = fs::read_dir(self.layout.opts_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| {
                        (
                            e.file_name().to_string_lossy().to_string(),
                            fs::read_to_string(e.path()).unwrap_or_default(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        files.sort();
        files
    }
}

/// Installer that lays out a minimal distribution for each known dependency
#[derive(Default)]
pub struct FakeInstaller {
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, dependency: &str) -> Self {
        self.failing.push(dependency.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn touch(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, "")
}

impl Installer for FakeInstaller {
    fn install(
        &self,
        dependency: &str,
        version_hint: Option<&str>,
        dest: &Path,
    ) -> Result<String, InstallError> {
        self.calls.lock().unwrap().push(dependency.to_string());
        if self.failing.iter().any(|f| f == dependency) {
            return Err(InstallError::UnknownDependency(dependency.to_string()));
        }

        let copy_error = |source| InstallError::Copy {
            path: dest.to_path_buf(),
            source,
        };
        if dest.exists() {
            fs::remove_dir_all(dest).map_err(copy_error)?;
        }

        let version = match dependency {
            "openjdk" | "zulu" | "zing" | "sapmachine" => {
                let home = dest.join("jdk-17.0.9");
                touch(&home.join("bin/java")).map_err(copy_error)?;
                fs::write(home.join("release"), "JAVA_VERSION=\"17.0.9\"\n").map_err(copy_error)?;
                "17.0.9"
            }
            "tomcat" => {
                touch(&dest.join("apache-tomcat-10.1.16/bin/catalina.sh")).map_err(copy_error)?;
                "10.1.16"
            }
            "groovy" => {
                touch(&dest.join("groovy-4.0.15/bin/groovy")).map_err(copy_error)?;
                "4.0.15"
            }
            "introscope-agent" => {
                touch(&dest.join("wily/Agent.jar")).map_err(copy_error)?;
                "10.7.0"
            }
            "sealights-agent" => {
                touch(&dest.join("sl-test-listener.jar")).map_err(copy_error)?;
                "4.0.2"
            }
            "takipi" => {
                touch(&dest.join("lib/libTakipiAgent.so")).map_err(copy_error)?;
                "4.73.1"
            }
            "jrebel" => {
                touch(&dest.join("jrebel/lib/libjrebel64.so")).map_err(copy_error)?;
                "2023.4.2"
            }
            other => return Err(InstallError::UnknownDependency(other.to_string())),
        };
        Ok(version_hint.unwrap_or(version).to_string())
    }
}

/// Shared, ordered record of every plugin operation
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detect {
    Yes,
    No,
    Broken,
}

/// Plugin whose every outcome is scripted by the test
pub struct ScriptedPlugin {
    name: String,
    detect: Detect,
    fail_install: bool,
    fail_configure: bool,
    block_opts_dir: bool,
    fragment: Option<(u8, String, String)>,
    command: String,
    context: Arc<StagingContext>,
    log: CallLog,
}

impl ScriptedPlugin {
    pub fn new(name: &str, context: &Arc<StagingContext>, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            detect: Detect::Yes,
            fail_install: false,
            fail_configure: false,
            block_opts_dir: false,
            fragment: None,
            command: format!("exec ./{}", name),
            context: Arc::clone(context),
            log: Arc::clone(log),
        }
    }

    pub fn detect(mut self, detect: Detect) -> Self {
        self.detect = detect;
        self
    }

    pub fn fail_install(mut self) -> Self {
        self.fail_install = true;
        self
    }

    pub fn fail_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    /// Replace the fragment directory with a plain file during Install, so
    /// every later fragment write fails
    pub fn block_opts_dir(mut self) -> Self {
        self.block_opts_dir = true;
        self
    }

    pub fn fragment(mut self, priority: u8, owner: &str, content: &str) -> Self {
        self.fragment = Some((priority, owner.to_string(), content.to_string()));
        self
    }

    pub fn command(mut self, command: &str) -> Self {
        self.command = command.to_string();
        self
    }

    fn record(&self, operation: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, self.name));
    }
}

impl Plugin for ScriptedPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self) -> Result<Option<String>> {
        self.record("detect");
        match self.detect {
            Detect::Yes => Ok(Some(format!("{}=1.0", self.name))),
            Detect::No => Ok(None),
            Detect::Broken => Err(anyhow!("{} detector exploded", self.name)),
        }
    }

    fn install(&self) -> Result<()> {
        self.record("install");
        if self.block_opts_dir {
            let opts_dir = self.context.layout().opts_dir();
            fs::remove_dir_all(&opts_dir)?;
            fs::write(&opts_dir, "not a directory")?;
        }
        if self.fail_install {
            return Err(anyhow!("{} could not be installed", self.name));
        }
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        self.record("configure");
        if let Some((priority, owner, content)) = &self.fragment {
            self.context
                .opts()
                .write_fragment(*priority, owner, content)?;
        }
        if self.fail_configure {
            return Err(anyhow!("{} could not be configured", self.name));
        }
        Ok(())
    }
}

impl Container for ScriptedPlugin {
    fn command(&self) -> Result<String> {
        Ok(self.command.clone())
    }
}

impl Jre for ScriptedPlugin {
    fn java_home(&self) -> Option<PathBuf> {
        None
    }
}

/// Progress handler that keeps every event for inspection
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
