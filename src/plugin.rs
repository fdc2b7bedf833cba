//! The plugin capability set
//!
//! Every unit the coordinator drives implements [`Plugin`]. Plugins receive
//! their [`StagingContext`](crate::context::StagingContext) when constructed,
//! so the three operations take no arguments and never read process state.
//! Each operation must be safe to repeat: a plugin re-derives everything from
//! the context and the staging filesystem on every call.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

pub trait Plugin: Send + Sync {
    /// Unique name within its registration list, used in logs and reports
    fn name(&self) -> &str;

    /// `Some(label)` when the plugin applies to this application.
    /// An `Err` is a broken detector, not a negative answer.
    fn detect(&self) -> Result<Option<String>>;

    fn install(&self) -> Result<()>;

    fn configure(&self) -> Result<()>;
}

/// A packaging archetype: the plugin that knows how to start the application
pub trait Container: Plugin {
    /// Shell command the platform runs to start the application
    fn command(&self) -> Result<String>;
}

/// A Java runtime provider
pub trait Jre: Plugin {
    /// The installed `JAVA_HOME`, once `install` has run
    fn java_home(&self) -> Option<PathBuf>;
}

impl<P: Plugin + ?Sized> Plugin for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(&self) -> Result<Option<String>> {
        (**self).detect()
    }

    fn install(&self) -> Result<()> {
        (**self).install()
    }

    fn configure(&self) -> Result<()> {
        (**self).configure()
    }
}

/// Label in the `<name>=<version>` form plugins report on detection
pub fn version_label(name: &str, version: &str) -> String {
    if version.is_empty() {
        name.to_string()
    } else {
        format!("{}={}", name, version)
    }
}
