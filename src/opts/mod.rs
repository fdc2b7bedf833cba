//! Options fragments and their runtime composition
//!
//! Build-time steps never edit a shared `JAVA_OPTS` string. Each one writes
//! its own fragment file, `<NN>_<owner>.opts`, and a single profile.d script
//! merges them every time the application starts:
//!
//! 1. fragments sorted by priority, then by owner name
//! 2. each fragment flattened to one line and trimmed, empty ones dropped
//! 3. `$DEPS_DIR`, then `$HOME`, then `$JAVA_OPTS` substituted, where
//!    `$JAVA_OPTS` is the value the environment supplied before the merge
//! 4. the results joined with single spaces and trimmed
//!
//! Priority 99 is reserved for the user's own options so they always land
//! last and can override every derived default.

mod compose;
mod store;

pub use compose::{assemble, compose_dir, ComposerScript, RuntimeEnv, SCRIPT_NAME, SCRIPT_VERSION};
pub use store::{Fragment, OptsStore, MAX_PRIORITY, USER_OWNER, USER_PRIORITY};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptsError {
    #[error("Fragment priority {0} is outside 0..=99")]
    InvalidPriority(u8),

    #[error("Invalid fragment owner '{0}': use letters, digits, '-' or '_'")]
    InvalidOwner(String),

    #[error("Priority {priority} is reserved for the user's options, not '{owner}'")]
    ReservedPriority { priority: u8, owner: String },

    #[error("Invalid deps index '{0}': must be numeric")]
    InvalidDepsIndex(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OptsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OptsError::Io {
            path: path.into(),
            source,
        }
    }
}
