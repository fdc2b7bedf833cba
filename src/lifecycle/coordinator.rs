use super::{Phase, PluginRecord, PluginState, StagingReport};
use crate::context::StagingContext;
use crate::error::StagingError;
use crate::opts::{ComposerScript, OptsError};
use crate::plugin::{Container, Jre, Plugin};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::registry::{ArchetypeRegistry, Selection};
use crate::release::ReleaseDescriptor;
use crate::{containers, frameworks, jres};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

struct Entry {
    plugin: Arc<dyn Plugin>,
    mandatory: bool,
    state: PluginState,
}

impl Entry {
    fn record(&self) -> PluginRecord {
        PluginRecord {
            name: self.plugin.name().to_string(),
            mandatory: self.mandatory,
            state: self.state.clone(),
        }
    }
}

pub struct Coordinator {
    context: Arc<StagingContext>,
    containers: ArchetypeRegistry<dyn Container>,
    jres: ArchetypeRegistry<dyn Jre>,
    frameworks: Vec<Arc<dyn Plugin>>,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl Coordinator {
    pub fn new(
        context: Arc<StagingContext>,
        containers: ArchetypeRegistry<dyn Container>,
        jres: ArchetypeRegistry<dyn Jre>,
        frameworks: Vec<Arc<dyn Plugin>>,
    ) -> Self {
        Self {
            context,
            containers,
            jres,
            frameworks,
            progress_handler: None,
        }
    }

    /// Coordinator over every built-in container, JRE and framework
    pub fn with_defaults(context: Arc<StagingContext>) -> Self {
        let containers = containers::registry(&context);
        let jres = jres::registry(&context);
        let frameworks = frameworks::all(&context);
        Self::new(context, containers, jres, frameworks)
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }

    /// Pick the container and the JRE; both are required
    pub fn select(&self) -> Result<(Selection<dyn Container>, Selection<dyn Jre>), StagingError> {
        let container = self
            .containers
            .select()
            .ok_or_else(|| StagingError::NoArchetype(self.context.build_dir().to_path_buf()))?;
        self.emit(ProgressEvent::ArchetypeSelected {
            registry: self.containers.kind(),
            plugin: container.candidate.name().to_string(),
            label: container.label.clone(),
        });

        let jre = self.jres.select().ok_or(StagingError::NoRuntime)?;
        self.emit(ProgressEvent::ArchetypeSelected {
            registry: self.jres.kind(),
            plugin: jre.candidate.name().to_string(),
            label: jre.label.clone(),
        });

        Ok((container, jre))
    }

    /// Stage the application: Detect, Install, Configure, then the composer
    /// script and the release descriptor.
    pub fn run(&self) -> Result<StagingReport, StagingError> {
        let start = Instant::now();
        self.emit(ProgressEvent::Started {
            build_dir: self.context.build_dir().display().to_string(),
        });

        match self.stage() {
            Ok(report) => {
                self.emit(ProgressEvent::Completed {
                    active_plugins: report.configured().count(),
                    abandoned_plugins: report.abandoned().count(),
                    total_time: start.elapsed(),
                });
                Ok(report)
            }
            Err(e) => {
                self.emit(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn stage(&self) -> Result<StagingReport, StagingError> {
        let layout = self.context.layout();
        layout
            .ensure_dirs()
            .map_err(|e| StagingError::filesystem(layout.dep_dir(), e))?;
        // Fragments from an earlier run must not leak into this one
        self.context.opts().reset()?;

        let (container, jre) = self.select()?;

        let mut entries = Vec::with_capacity(self.frameworks.len() + 2);
        entries.push(Entry {
            plugin: Arc::new(Arc::clone(&container.candidate)),
            mandatory: true,
            state: PluginState::Active {
                label: container.label.clone(),
            },
        });
        entries.push(Entry {
            plugin: Arc::new(Arc::clone(&jre.candidate)),
            mandatory: true,
            state: PluginState::Active {
                label: jre.label.clone(),
            },
        });
        entries.extend(self.frameworks.iter().map(|plugin| Entry {
            plugin: Arc::clone(plugin),
            mandatory: false,
            state: PluginState::Unstarted,
        }));

        for phase in Phase::ALL {
            self.run_phase(phase, &mut entries)?;
        }

        ComposerScript::new(&layout.deps_idx)?.install(layout)?;

        let command = container
            .candidate
            .command()
            .map_err(|source| StagingError::MandatoryPluginFailed {
                plugin: container.candidate.name().to_string(),
                phase: Phase::Configure,
                source,
            })?;
        let java_home = jre.candidate.java_home().map(|home| layout.runtime_path(&home));
        debug!(java_home = ?java_home, "Runtime located");

        let release_path = layout.release_file();
        ReleaseDescriptor::new(command.clone())?.write(&release_path)?;
        self.emit(ProgressEvent::ReleaseWritten {
            path: release_path.display().to_string(),
            command: command.clone(),
        });

        Ok(StagingReport {
            container: container.label,
            jre: jre.label,
            java_home,
            command,
            plugins: entries.iter().map(Entry::record).collect(),
        })
    }

    fn run_phase(&self, phase: Phase, entries: &mut [Entry]) -> Result<(), StagingError> {
        let participants = entries.iter().filter(|e| e.state.runs_in(phase)).count();
        self.emit(ProgressEvent::PhaseStarted {
            phase,
            plugins: participants,
        });
        let phase_start = Instant::now();

        for entry in entries.iter_mut() {
            if !entry.state.runs_in(phase) {
                continue;
            }
            entry.state = self.step(phase, entry)?;
        }

        self.emit(ProgressEvent::PhaseComplete {
            phase,
            duration: phase_start.elapsed(),
        });
        Ok(())
    }

    /// Run one plugin through one phase and return its next state
    fn step(&self, phase: Phase, entry: &Entry) -> Result<PluginState, StagingError> {
        let name = entry.plugin.name();

        if phase == Phase::Detect {
            return Ok(match entry.plugin.detect() {
                Ok(Some(label)) => {
                    self.emit(ProgressEvent::PluginActivated {
                        plugin: name.to_string(),
                        label: label.clone(),
                    });
                    PluginState::Active { label }
                }
                Ok(None) => {
                    debug!(plugin = name, "Plugin not applicable");
                    PluginState::Skipped
                }
                Err(e) => {
                    warn!(plugin = name, phase = %phase, error = %format!("{:#}", e), "Detection failed, skipping plugin");
                    PluginState::Skipped
                }
            });
        }

        let label = entry.state.label().unwrap_or_default().to_string();
        let outcome = match phase {
            Phase::Install => entry.plugin.install(),
            _ => entry.plugin.configure(),
        };

        match outcome {
            Ok(()) => {
                debug!(plugin = name, phase = %phase, "Plugin step complete");
                Ok(match phase {
                    Phase::Install => PluginState::Installed { label },
                    _ => PluginState::Configured { label },
                })
            }
            Err(e) => {
                let e = escalate_filesystem(e)?;
                if entry.mandatory {
                    return Err(StagingError::MandatoryPluginFailed {
                        plugin: name.to_string(),
                        phase,
                        source: e,
                    });
                }

                let error = format!("{:#}", e);
                warn!(plugin = name, phase = %phase, error = %error, "Optional plugin failed, abandoning it");
                self.emit(ProgressEvent::PluginAbandoned {
                    plugin: name.to_string(),
                    phase,
                    error: error.clone(),
                });
                Ok(match phase {
                    Phase::Install => PluginState::InstallFailed { error },
                    _ => PluginState::ConfigureFailed { error },
                })
            }
        }
    }

    /// Names of every registered plugin, in registration order
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.names().into_iter().map(String::from).collect();
        names.extend(self.jres.names().into_iter().map(String::from));
        names.extend(self.frameworks.iter().map(|f| f.name().to_string()));
        names
    }
}

/// A fragment write that hit the staging filesystem aborts the build, even
/// when an optional plugin was the one writing
fn escalate_filesystem(error: anyhow::Error) -> Result<anyhow::Error, StagingError> {
    if !matches!(error.downcast_ref::<OptsError>(), Some(OptsError::Io { .. })) {
        return Ok(error);
    }
    match error.downcast::<OptsError>() {
        Ok(opts_error) => Err(opts_error.into()),
        Err(error) => Ok(error),
    }
}
