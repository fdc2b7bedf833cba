use super::write_opts;
use crate::context::StagingContext;
use crate::plugin::{version_label, Plugin};
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

const PRIORITY: u8 = 29;
const OWNER: &str = "jmx";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct JmxConfig {
    enabled: bool,
    port: u16,
}

impl Default for JmxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 5000,
        }
    }
}

/// Unauthenticated JMX on a fixed port, reached through an SSH tunnel
pub struct Jmx {
    context: Arc<StagingContext>,
}

impl Jmx {
    pub fn new(context: Arc<StagingContext>) -> Self {
        Self { context }
    }

    fn config(&self) -> JmxConfig {
        self.context.overrides().decode_or_default("jmx")
    }
}

impl Plugin for Jmx {
    fn name(&self) -> &str {
        "JMX"
    }

    fn detect(&self) -> Result<Option<String>> {
        let config = self.config();
        Ok(config
            .enabled
            .then(|| version_label(self.name(), &config.port.to_string())))
    }

    fn install(&self) -> Result<()> {
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        let port = self.config().port;
        write_opts(
            &self.context,
            PRIORITY,
            OWNER,
            &[
                "-Djava.rmi.server.hostname=127.0.0.1".to_string(),
                "-Dcom.sun.management.jmxremote.authenticate=false".to_string(),
                "-Dcom.sun.management.jmxremote.ssl=false".to_string(),
                format!("-Dcom.sun.management.jmxremote.port={}", port),
                format!("-Dcom.sun.management.jmxremote.rmi.port={}", port),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{context_with, staged_context};
    use crate::fs::MockFileSystem;
    use crate::installer::MockInstaller;
    use crate::overrides::Overrides;
    use tempfile::TempDir;
    use yare::parameterized;

    #[parameterized(
        absent = { None, None },
        disabled = { Some("{enabled: false}"), None },
        default_port = { Some("{enabled: true}"), Some("JMX=5000") },
        custom_port = { Some("{enabled: true, port: 5001}"), Some("JMX=5001") },
        legacy_list = { Some("[enabled: true, port: 6000]"), Some("JMX=6000") },
        malformed = { Some("{enabled: ["), None },
    )]
    fn test_detect(raw: Option<&str>, expected: Option<&str>) {
        let overrides = match raw {
            Some(raw) => Overrides::default().with("jmx", raw),
            None => Overrides::default(),
        };
        let context = context_with(MockFileSystem::new(), overrides);
        assert_eq!(Jmx::new(context).detect().unwrap().as_deref(), expected);
    }

    #[test]
    fn test_configure() {
        let temp = TempDir::new().unwrap();
        let overrides = Overrides::default().with("jmx", "{enabled: true, port: 5001}");
        let context = staged_context(temp.path(), overrides, MockInstaller::new());

        Jmx::new(Arc::clone(&context)).configure().unwrap();

        let fragments = context.opts().read_fragments().unwrap();
        assert_eq!(fragments[0].file_name(), "29_jmx.opts");
        assert_eq!(
            fragments[0].content,
            "-Djava.rmi.server.hostname=127.0.0.1 \
             -Dcom.sun.management.jmxremote.authenticate=false \
             -Dcom.sun.management.jmxremote.ssl=false \
             -Dcom.sun.management.jmxremote.port=5001 \
             -Dcom.sun.management.jmxremote.rmi.port=5001"
        );
    }
}
