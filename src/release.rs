//! Release descriptor
//!
//! Staging ends by recording how to start the application. The release step
//! runs later, in a separate process, and only re-emits that file.

use crate::error::exit_code;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Release descriptor not found at {0}; run supply first")]
    Missing(PathBuf),

    #[error("Failed to read release descriptor {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed release descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write release descriptor {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Start command is empty")]
    EmptyCommand,

    #[error("Failed to serialize release descriptor: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

impl ReleaseError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Missing(_) | ReleaseError::Read { .. } | ReleaseError::Parse { .. } => {
                exit_code::RELEASE_UNAVAILABLE
            }
            ReleaseError::Write { .. } => exit_code::FILESYSTEM,
            ReleaseError::EmptyCommand | ReleaseError::Serialize(_) => exit_code::INTERNAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTypes {
    pub web: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub default_process_types: ProcessTypes,
}

impl ReleaseDescriptor {
    pub fn new(command: impl Into<String>) -> Result<Self, ReleaseError> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(ReleaseError::EmptyCommand);
        }
        Ok(Self {
            default_process_types: ProcessTypes { web: command },
        })
    }

    pub fn command(&self) -> &str {
        &self.default_process_types.web
    }

    pub fn to_yaml(&self) -> Result<String, ReleaseError> {
        serde_yaml::to_string(self).map_err(ReleaseError::Serialize)
    }

    pub fn write(&self, path: &Path) -> Result<(), ReleaseError> {
        let yaml = self.to_yaml()?;
        let write_err = |source| ReleaseError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, yaml).map_err(write_err)
    }

    pub fn read(path: &Path) -> Result<Self, ReleaseError> {
        let raw = read_raw(path)?;
        serde_yaml::from_str(&raw).map_err(|source| ReleaseError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// File content exactly as written, after checking it still parses
pub fn read_verbatim(path: &Path) -> Result<String, ReleaseError> {
    let raw = read_raw(path)?;
    serde_yaml::from_str::<ReleaseDescriptor>(&raw).map_err(|source| ReleaseError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw)
}

fn read_raw(path: &Path) -> Result<String, ReleaseError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ReleaseError::Missing(path.to_path_buf()),
        _ => ReleaseError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tmp/java-buildpack-release-step.yml");

        let descriptor = ReleaseDescriptor::new("$JAVA_HOME/bin/java $JAVA_OPTS -jar app.jar").unwrap();
        descriptor.write(&path).unwrap();

        let read = ReleaseDescriptor::read(&path).unwrap();
        assert_eq!(read, descriptor);
        assert_eq!(read.command(), "$JAVA_HOME/bin/java $JAVA_OPTS -jar app.jar");

        let raw = read_verbatim(&path).unwrap();
        assert!(raw.starts_with("default_process_types:"));
        assert!(raw.contains("web:"));
    }

    #[test]
    fn test_missing_descriptor() {
        let temp = TempDir::new().unwrap();
        let err = read_verbatim(&temp.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, ReleaseError::Missing(_)));
        assert_eq!(err.exit_code(), exit_code::RELEASE_UNAVAILABLE);
    }

    #[test]
    fn test_malformed_descriptor() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("release.yml");
        fs::write(&path, "default_process_types: [oops").unwrap();
        let err = ReleaseDescriptor::read(&path).unwrap_err();
        assert!(matches!(err, ReleaseError::Parse { .. }));
        assert_eq!(err.exit_code(), exit_code::RELEASE_UNAVAILABLE);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            ReleaseDescriptor::new("  "),
            Err(ReleaseError::EmptyCommand)
        ));
    }
}
