use super::Phase;
use serde::Serialize;

/// Where a plugin ended up. Transitions only move forward:
/// `Unstarted -> Active | Skipped -> Installed | InstallFailed -> Configured | ConfigureFailed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PluginState {
    Unstarted,
    /// Detected as applicable
    Active { label: String },
    /// Not applicable, or its detector failed
    Skipped,
    Installed { label: String },
    InstallFailed { error: String },
    Configured { label: String },
    ConfigureFailed { error: String },
}

impl PluginState {
    /// Whether the plugin takes part in `phase`
    pub fn runs_in(&self, phase: Phase) -> bool {
        matches!(
            (phase, self),
            (Phase::Detect, PluginState::Unstarted)
                | (Phase::Install, PluginState::Active { .. })
                | (Phase::Configure, PluginState::Installed { .. })
        )
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            PluginState::Active { label }
            | PluginState::Installed { label }
            | PluginState::Configured { label } => Some(label),
            _ => None,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(
            self,
            PluginState::InstallFailed { .. } | PluginState::ConfigureFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRecord {
    pub name: String,
    pub mandatory: bool,
    #[serde(flatten)]
    pub state: PluginState,
}

/// Outcome of a successful staging run
#[derive(Debug, Clone, Serialize)]
pub struct StagingReport {
    pub container: String,
    pub jre: String,
    /// `JAVA_HOME` as the running application sees it
    pub java_home: Option<String>,
    pub command: String,
    pub plugins: Vec<PluginRecord>,
}

impl StagingReport {
    pub fn record(&self, name: &str) -> Option<&PluginRecord> {
        self.plugins.iter().find(|p| p.name == name)
    }

    /// Plugins that made it through Configure
    pub fn configured(&self) -> impl Iterator<Item = &PluginRecord> {
        self.plugins
            .iter()
            .filter(|p| matches!(p.state, PluginState::Configured { .. }))
    }

    pub fn abandoned(&self) -> impl Iterator<Item = &PluginRecord> {
        self.plugins.iter().filter(|p| p.state.is_abandoned())
    }
}
