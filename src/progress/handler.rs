//! Progress handler trait and events

use crate::lifecycle::Phase;
use std::time::Duration;

/// Events emitted while a build is staged
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Staging started
    Started { build_dir: String },

    /// A registry picked its archetype
    ArchetypeSelected {
        registry: &'static str,
        plugin: String,
        label: String,
    },

    /// An optional plugin claimed the application
    PluginActivated { plugin: String, label: String },

    /// A global phase started
    PhaseStarted { phase: Phase, plugins: usize },

    /// A global phase finished for every active plugin
    PhaseComplete { phase: Phase, duration: Duration },

    /// An optional plugin failed and was abandoned for the rest of the run
    PluginAbandoned {
        plugin: String,
        phase: Phase,
        error: String,
    },

    /// Start command computed and release descriptor written
    ReleaseWritten { path: String, command: String },

    /// Staging completed successfully
    Completed {
        active_plugins: usize,
        abandoned_plugins: usize,
        total_time: Duration,
    },

    /// Staging aborted
    Failed { error: String },
}

/// Trait for handling progress events during staging
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
