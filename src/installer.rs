//! Dependency installation seam
//!
//! Plugins ask for a dependency by name and an optional version hint
//! (`17`, `17.+`, `1.2.3`); the installer decides where the bits come
//! from. [`OfflineInstaller`] resolves names against the buildpack's
//! `manifest.yml` and copies pre-packaged trees. Downloading is left to
//! other implementations of [`Installer`].

use serde::Deserialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Dependency '{0}' is not listed in the manifest")]
    UnknownDependency(String),

    #[error("No version of '{name}' matches '{hint}'")]
    NoMatchingVersion { name: String, hint: String },

    #[error("Failed to read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Dependency source {0} does not exist")]
    MissingSource(PathBuf),

    #[error("Failed to copy into {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[cfg_attr(test, mockall::automock)]
pub trait Installer: Send + Sync {
    /// Install `dependency` into `dest`, returning the version installed
    fn install<'a>(
        &self,
        dependency: &str,
        version_hint: Option<&'a str>,
        dest: &Path,
    ) -> Result<String, InstallError>;
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: Vec<ManifestDependency>,
    #[serde(default)]
    pub default_versions: Vec<DefaultVersion>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ManifestDependency {
    pub name: String,
    pub version: String,
    /// Relative to the buildpack root
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DefaultVersion {
    pub name: String,
    pub version: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, InstallError> {
        let content = fs::read_to_string(path).map_err(|source| InstallError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| InstallError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn default_version(&self, name: &str) -> Option<&str> {
        self.default_versions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.version.as_str())
    }

    /// Highest listed version of `name` matching `hint`, or the manifest default
    pub fn resolve(&self, name: &str, hint: Option<&str>) -> Result<&ManifestDependency, InstallError> {
        let candidates: Vec<&ManifestDependency> =
            self.dependencies.iter().filter(|d| d.name == name).collect();
        if candidates.is_empty() {
            return Err(InstallError::UnknownDependency(name.to_string()));
        }

        let hint = hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .or_else(|| self.default_version(name))
            .unwrap_or("");

        candidates
            .into_iter()
            .filter(|d| version_matches(hint, &d.version))
            .max_by(|a, b| compare_versions(&a.version, &b.version))
            .ok_or_else(|| InstallError::NoMatchingVersion {
                name: name.to_string(),
                hint: hint.to_string(),
            })
    }
}

/// `17`, `17.+`, `17.x` and `17.0.*` all match `17.0.9`; empty matches anything
pub fn version_matches(hint: &str, version: &str) -> bool {
    let prefix = hint
        .trim()
        .trim_end_matches(['+', '*', 'x'])
        .trim_end_matches('.');
    if prefix.is_empty() {
        return true;
    }
    version == prefix
        || version
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(['.', '_', '-', '+']))
}

/// Numeric-aware comparison of dotted versions
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts = |v: &str| -> Vec<String> {
        v.split(['.', '_', '-', '+'])
            .map(str::to_string)
            .collect()
    };
    let (pa, pb) = (parts(a), parts(b));

    for (x, y) in pa.iter().zip(pb.iter()) {
        let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    pa.len().cmp(&pb.len())
}

/// Installs from trees shipped inside the buildpack
#[derive(Debug, Clone)]
pub struct OfflineInstaller {
    root: PathBuf,
    manifest: Manifest,
}

impl OfflineInstaller {
    pub fn new(root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    /// Read `<root>/manifest.yml`
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, InstallError> {
        let root = root.into();
        let manifest = Manifest::load(&root.join(crate::config::MANIFEST_FILE))?;
        Ok(Self::new(root, manifest))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl Installer for OfflineInstaller {
    fn install(
        &self,
        dependency: &str,
        version_hint: Option<&str>,
        dest: &Path,
    ) -> Result<String, InstallError> {
        let resolved = self.manifest.resolve(dependency, version_hint)?;
        let source = self.root.join(&resolved.path);
        if !source.exists() {
            return Err(InstallError::MissingSource(source));
        }

        info!(dependency, version = %resolved.version, dest = %dest.display(), "Installing dependency");
        replace_dir(dest)?;

        if source.is_file() {
            let file_name = source.file_name().map(PathBuf::from).unwrap_or_default();
            let target = dest.join(file_name);
            fs::copy(&source, &target).map_err(|e| copy_error(&target, e))?;
        } else {
            copy_tree(&source, dest)?;
        }

        Ok(resolved.version.clone())
    }
}

fn replace_dir(dest: &Path) -> Result<(), InstallError> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| copy_error(dest, e))?;
    }
    fs::create_dir_all(dest).map_err(|e| copy_error(dest, e))
}

fn copy_tree(source: &Path, dest: &Path) -> Result<(), InstallError> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| InstallError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_error(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| copy_error(&target, e))?;
            debug!(file = %target.display(), "Copied");
        }
    }
    Ok(())
}

fn copy_error(path: &Path, source: std::io::Error) -> InstallError {
    InstallError::Copy {
        path: path.to_path_buf(),
        source,
    }
}
