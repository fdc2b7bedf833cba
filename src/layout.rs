//! Staging directory layout
//!
//! The platform stages with four arguments: the application directory, a
//! cache directory, the shared dependencies directory and this stage's
//! index into it. Everything this tool installs lands under
//! `<deps_dir>/<deps_idx>`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OPTS_DIR_NAME: &str = "java_opts";
pub const RELEASE_FILE: &str = "tmp/java-buildpack-release-step.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    pub build_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub deps_dir: PathBuf,
    pub deps_idx: String,
}

impl StagingLayout {
    pub fn new(
        build_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        deps_dir: impl Into<PathBuf>,
        deps_idx: impl Into<String>,
    ) -> Self {
        Self {
            build_dir: build_dir.into(),
            cache_dir: cache_dir.into(),
            deps_dir: deps_dir.into(),
            deps_idx: deps_idx.into(),
        }
    }

    /// Layout for commands that only look at the application directory
    pub fn for_build_dir(build_dir: impl Into<PathBuf>) -> Self {
        let build_dir = build_dir.into();
        let scratch = build_dir.join(".javastage");
        Self::new(build_dir, scratch.join("cache"), scratch.join("deps"), "0")
    }

    pub fn dep_dir(&self) -> PathBuf {
        self.deps_dir.join(&self.deps_idx)
    }

    /// Directory holding the options fragments for this build
    pub fn opts_dir(&self) -> PathBuf {
        self.dep_dir().join(OPTS_DIR_NAME)
    }

    pub fn env_dir(&self) -> PathBuf {
        self.dep_dir().join("env")
    }

    pub fn profile_d_dir(&self) -> PathBuf {
        self.dep_dir().join("profile.d")
    }

    pub fn release_file(&self) -> PathBuf {
        self.build_dir.join(RELEASE_FILE)
    }

    /// Directory a plugin owns for its installed artifacts
    pub fn plugin_dir(&self, owner: &str) -> PathBuf {
        self.dep_dir().join(owner)
    }

    /// How `path`, written at staging time, is spelled once the app runs.
    /// Paths under the dep dir become `$DEPS_DIR/<idx>/...`.
    pub fn runtime_path(&self, path: &Path) -> String {
        match path.strip_prefix(self.dep_dir()) {
            Ok(relative) if relative.as_os_str().is_empty() => {
                format!("$DEPS_DIR/{}", self.deps_idx)
            }
            Ok(relative) => format!("$DEPS_DIR/{}/{}", self.deps_idx, relative.display()),
            Err(_) => path.display().to_string(),
        }
    }

    /// Create the standard directories under the dep dir
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in ["bin", "lib", "env", "profile.d"] {
            fs::create_dir_all(self.dep_dir().join(dir))?;
        }
        Ok(())
    }

    /// Declare an environment variable for later build steps and the running app
    pub fn write_env_file(&self, name: &str, value: &str) -> io::Result<PathBuf> {
        let path = self.env_dir().join(name);
        write_file(&path, value)?;
        debug!(file = %path.display(), "Wrote env file");
        Ok(path)
    }

    pub fn read_env_file(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.env_dir().join(name))
            .ok()
            .map(|v| v.trim().to_string())
    }

    /// Write a script sourced before the application starts
    pub fn write_profile_d(&self, name: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.profile_d_dir().join(name);
        write_file(&path, content)?;
        debug!(file = %path.display(), "Wrote profile.d script");
        Ok(path)
    }
}

/// Locate the home of an unpacked distribution inside `dir`.
///
/// Archives usually unpack into a single versioned child (`jdk-17.0.9`,
/// `apache-tomcat-10.1.16`), so the first child, in name order, whose name
/// starts with one of `prefixes` and that contains `marker` wins. Failing
/// that, `dir` itself is the home when it contains `marker`.
pub fn find_home(dir: &Path, prefixes: &[&str], marker: &str) -> Option<PathBuf> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    children
        .into_iter()
        .find(|child| {
            let name = child
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            prefixes.iter().any(|p| name.starts_with(p)) && child.join(marker).exists()
        })
        .or_else(|| dir.join(marker).exists().then(|| dir.to_path_buf()))
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}
