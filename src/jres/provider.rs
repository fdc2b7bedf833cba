use super::{installed_java_home, OWNER, PRIORITY};
use crate::context::StagingContext;
use crate::overrides::VersionSpec;
use crate::plugin::{version_label, Jre, Plugin};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// What distinguishes one distribution from another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JreSpec {
    pub name: &'static str,
    /// Name in the dependency manifest
    pub dependency: &'static str,
    /// Override variable suffix, e.g. `zulu_jre` for `JBP_CONFIG_ZULU_JRE`
    pub config_key: &'static str,
    /// Case-insensitive markers looked for in `<PREFIX>_COMPONENTS`
    pub markers: &'static [&'static str],
    /// Detects with no configuration at all
    pub universal: bool,
}

pub const ZING: JreSpec = JreSpec {
    name: "Zing",
    dependency: "zing",
    config_key: "zing_jre",
    markers: &["zing"],
    universal: false,
};

pub const ZULU: JreSpec = JreSpec {
    name: "Zulu",
    dependency: "zulu",
    config_key: "zulu_jre",
    markers: &["zulu"],
    universal: false,
};

pub const SAP_MACHINE: JreSpec = JreSpec {
    name: "SapMachine",
    dependency: "sapmachine",
    config_key: "sap_machine_jre",
    markers: &["sapmachine", "sap_machine"],
    universal: false,
};

pub const OPEN_JDK: JreSpec = JreSpec {
    name: "OpenJDK",
    dependency: "openjdk",
    config_key: "open_jdk_jre",
    markers: &["openjdk", "open_jdk"],
    universal: true,
};

const BASE_OPTS: &str = "-XX:+ExitOnOutOfMemoryError";

#[derive(Debug, Default, Deserialize)]
struct JreConfig {
    #[serde(default)]
    jre: VersionSpec,
}

pub struct JreProvider {
    spec: JreSpec,
    context: Arc<StagingContext>,
}

impl JreProvider {
    pub fn new(spec: JreSpec, context: Arc<StagingContext>) -> Self {
        Self { spec, context }
    }

    pub fn spec(&self) -> &JreSpec {
        &self.spec
    }

    fn requested_by_components(&self) -> bool {
        self.context
            .overrides()
            .raw("components")
            .map(|raw| {
                let raw = raw.to_lowercase();
                self.spec.markers.iter().any(|m| raw.contains(m))
            })
            .unwrap_or(false)
    }

    fn version_hint(&self) -> Option<String> {
        let config: JreConfig = self.context.overrides().decode_or_default(self.spec.config_key);
        config.jre.hint()
    }

    fn profile_script(&self, home: &str) -> String {
        format!(
            "export JAVA_HOME={home}\nexport JRE_HOME=$JAVA_HOME\nexport PATH=$JAVA_HOME/bin:$PATH\n"
        )
    }
}

impl Plugin for JreProvider {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn detect(&self) -> Result<Option<String>> {
        let wanted = self.spec.universal
            || self.requested_by_components()
            || self.context.overrides().is_set(self.spec.config_key);
        if !wanted {
            return Ok(None);
        }
        let hint = self.version_hint().unwrap_or_default();
        Ok(Some(version_label(self.spec.name, &hint)))
    }

    fn install(&self) -> Result<()> {
        let layout = self.context.layout();
        let hint = self.version_hint();
        let version = self.context.installer().install(
            self.spec.dependency,
            hint.as_deref(),
            &layout.plugin_dir(OWNER),
        )?;

        let home = self.java_home().ok_or_else(|| {
            anyhow!(
                "{} {} has no bin/java under {}",
                self.spec.name,
                version,
                layout.plugin_dir(OWNER).display()
            )
        })?;
        debug!(java_home = %home.display(), "Located JAVA_HOME");

        layout
            .write_profile_d("java.sh", &self.profile_script(&layout.runtime_path(&home)))
            .context("Failed to write profile.d/java.sh")?;
        info!(jre = %self.spec.name, version = %version, "Installed JRE");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        self.context
            .opts()
            .write_fragment(PRIORITY, OWNER, BASE_OPTS)
            .context("Failed to write JRE options")?;
        Ok(())
    }
}

impl Jre for JreProvider {
    fn java_home(&self) -> Option<PathBuf> {
        installed_java_home(self.context.layout())
    }
}
