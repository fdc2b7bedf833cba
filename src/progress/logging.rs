//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { build_dir } => {
                info!(build_dir = %build_dir, "Starting staging");
            }
            ProgressEvent::ArchetypeSelected {
                registry,
                plugin,
                label,
            } => {
                info!(registry, plugin = %plugin, label = %label, "Archetype selected");
            }
            ProgressEvent::PluginActivated { plugin, label } => {
                info!(plugin = %plugin, label = %label, "Plugin active");
            }
            ProgressEvent::PhaseStarted { phase, plugins } => {
                debug!(phase = %phase, plugins, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::PluginAbandoned {
                plugin,
                phase,
                error,
            } => {
                warn!(plugin = %plugin, phase = %phase, error = %error, "Optional plugin abandoned");
            }
            ProgressEvent::ReleaseWritten { path, command } => {
                info!(path = %path, command = %command, "Release descriptor written");
            }
            ProgressEvent::Completed {
                active_plugins,
                abandoned_plugins,
                total_time,
            } => {
                if *abandoned_plugins > 0 {
                    warn!(
                        active = active_plugins,
                        abandoned = abandoned_plugins,
                        total_time_ms = total_time.as_millis(),
                        "Staging complete with abandoned plugins"
                    );
                } else {
                    info!(
                        active = active_plugins,
                        total_time_ms = total_time.as_millis(),
                        "Staging complete"
                    );
                }
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Staging failed");
            }
        }
    }
}
