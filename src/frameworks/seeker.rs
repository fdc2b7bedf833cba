use super::{find_file, write_opts};
use crate::context::StagingContext;
use crate::plugin::Plugin;
use crate::services::ServiceBinding;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::info;

const PRIORITY: u8 = 18;
const OWNER: &str = "seeker_security_provider";
const DEPENDENCY: &str = "seeker-agent";
const SERVICE_IDS: &[&str] = &["seeker"];
const SERVER_URL: &str = "seeker_server_url";
const AGENT_JAR: &str = "seeker-agent.jar";

/// Synopsys Seeker IAST agent, enabled by a bound Seeker service that
/// carries a server URL
pub struct SeekerSecurityProvider {
    context: Arc<StagingContext>,
}

impl SeekerSecurityProvider {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn binding(&self) -> Option<&ServiceBinding> {
        self.context
            .services()
            .find(SERVICE_IDS)
            .filter(|binding| binding.has_credential(&[SERVER_URL]))
    }
}

impl Plugin for SeekerSecurityProvider {
    fn name(&self) -> &str {
        "Seeker Security Provider"
    }

    fn detect(&self) -> Result<Option<String>> {
        Ok(self.binding().map(|_| self.name().to_string()))
    }

    fn install(&self) -> Result<()> {
        let version = self.context.installer().install(
            DEPENDENCY,
            None,
            &self.context.layout().plugin_dir(OWNER),
        )?;
        info!(version = %version, "Installed Seeker agent");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let layout = self.context.layout();
        let server_url = self
            .binding()
            .and_then(|binding| binding.credential(&[SERVER_URL]))
            .ok_or_else(|| anyhow!("Seeker service binding has no {}", SERVER_URL))?;
        let agent = find_file(&layout.plugin_dir(OWNER), |name| name == AGENT_JAR)
            .ok_or_else(|| anyhow!("{} not found in the Seeker installation", AGENT_JAR))?;

        layout
            .write_profile_d(
                "seeker_security_provider.sh",
                &format!("export SEEKER_SERVER_URL=\"{}\"\n", server_url),
            )
            .context("Failed to write profile.d/seeker_security_provider.sh")?;

        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[format!("-javaagent:{}", layout.runtime_path(&agent))],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::MockInstaller;
    use crate::layout::StagingLayout;
    use crate::services::ServiceCatalog;
    use std::fs;
    use tempfile::TempDir;
    use yare::parameterized;

    fn context(temp: &TempDir, catalog: &str) -> Arc<StagingContext> {
        let layout = StagingLayout::new(
            temp.path().join("app"),
            temp.path().join("cache"),
            temp.path().join("deps"),
            "0",
        );
        let mut installer = MockInstaller::new();
        installer
            .expect_install()
            .withf(|name, _, _| name == DEPENDENCY)
            .returning(|_, _, dest| {
                fs::create_dir_all(dest).unwrap();
                fs::write(dest.join(AGENT_JAR), "").unwrap();
                Ok("2024.3.0".to_string())
            });
        Arc::new(
            StagingContext::builder(layout, Arc::new(installer))
                .services(ServiceCatalog::parse(catalog))
                .build(),
        )
    }

    #[parameterized(
        by_type = { r#"{"seeker": [{"name": "s", "credentials": {"seeker_server_url": "https://seeker.local"}}]}"#, true },
        by_tag = { r#"{"user-provided": [{"name": "iast", "tags": ["seeker"], "credentials": {"seeker_server_url": "https://seeker.local"}}]}"#, true },
        by_name = { r#"{"user-provided": [{"name": "my-seeker", "credentials": {"seeker_server_url": "https://seeker.local"}}]}"#, true },
        without_server_url = { r#"{"seeker": [{"name": "s", "credentials": {}}]}"#, false },
        empty_server_url = { r#"{"seeker": [{"name": "s", "credentials": {"seeker_server_url": ""}}]}"#, false },
        unbound = { "{}", false },
    )]
    fn test_detect(catalog: &str, expected: bool) {
        let temp = TempDir::new().unwrap();
        let provider = SeekerSecurityProvider::new(context(&temp, catalog));
        assert_eq!(provider.detect().unwrap().is_some(), expected);
    }

    #[test]
    fn test_stage() {
        let temp = TempDir::new().unwrap();
        let context = context(
            &temp,
            r#"{"seeker": [{"name": "s", "credentials": {"seeker_server_url": "https://seeker.local:8082"}}]}"#,
        );
        let provider = SeekerSecurityProvider::new(Arc::clone(&context));
        provider.install().unwrap();
        provider.configure().unwrap();

        let layout = context.layout();
        let script =
            fs::read_to_string(layout.profile_d_dir().join("seeker_security_provider.sh")).unwrap();
        assert_eq!(script, "export SEEKER_SERVER_URL=\"https://seeker.local:8082\"\n");

        let fragments = context.opts().read_fragments().unwrap();
        assert_eq!(fragments[0].file_name(), "18_seeker_security_provider.opts");
        assert_eq!(
            fragments[0].content,
            "-javaagent:$DEPS_DIR/0/seeker_security_provider/seeker-agent.jar"
        );
    }

    #[test]
    fn test_configure_without_agent_fails() {
        let temp = TempDir::new().unwrap();
        let context = context(
            &temp,
            r#"{"seeker": [{"name": "s", "credentials": {"seeker_server_url": "https://seeker.local"}}]}"#,
        );
        assert!(SeekerSecurityProvider::new(context).configure().is_err());
    }
}
