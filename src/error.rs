//! Fatal error taxonomy for a staging run
//!
//! Only conditions that abort the whole build live here. Recoverable,
//! plugin-local failures never leave the coordinator; they are logged and
//! recorded in the [`StagingReport`](crate::lifecycle::StagingReport).

use crate::lifecycle::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes, one per fatal condition
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const INVALID_INVOCATION: i32 = 2;
    pub const NO_ARCHETYPE: i32 = 10;
    pub const NO_RUNTIME: i32 = 11;
    pub const MANDATORY_INSTALL_FAILED: i32 = 12;
    pub const MANDATORY_CONFIGURE_FAILED: i32 = 13;
    pub const FILESYSTEM: i32 = 14;
    pub const RELEASE_UNAVAILABLE: i32 = 15;
    pub const INTERNAL: i32 = 70;
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("No supported application type was detected in {0}")]
    NoArchetype(PathBuf),

    #[error("No Java runtime provider was detected")]
    NoRuntime,

    #[error("Mandatory plugin '{plugin}' failed during {phase}: {source:#}")]
    MandatoryPluginFailed {
        plugin: String,
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write to staging filesystem at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Release(#[from] crate::release::ReleaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StagingError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StagingError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            StagingError::NoArchetype(_) => exit_code::NO_ARCHETYPE,
            StagingError::NoRuntime => exit_code::NO_RUNTIME,
            StagingError::MandatoryPluginFailed { phase, .. } => match phase {
                Phase::Configure => exit_code::MANDATORY_CONFIGURE_FAILED,
                Phase::Detect | Phase::Install => exit_code::MANDATORY_INSTALL_FAILED,
            },
            StagingError::Filesystem { .. } => exit_code::FILESYSTEM,
            StagingError::Config(_) => exit_code::INVALID_INVOCATION,
            StagingError::Release(err) => err.exit_code(),
            StagingError::Internal(_) => exit_code::INTERNAL,
        }
    }
}

impl From<crate::opts::OptsError> for StagingError {
    fn from(err: crate::opts::OptsError) -> Self {
        match err {
            crate::opts::OptsError::Io { path, source } => StagingError::Filesystem { path, source },
            other => StagingError::Internal(other.to_string()),
        }
    }
}
