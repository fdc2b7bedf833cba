//! Packaging archetypes
//!
//! Exactly one container is selected per build. Detection markers overlap
//! (an exploded Boot jar also has a manifest with `Main-Class`, a Tomcat app
//! may carry jars), so registration order below is the tie-break.

mod dist_zip;
mod groovy;
mod java_main;
mod manifest;
mod spring_boot;
mod tomcat;

pub use dist_zip::DistZip;
pub use groovy::Groovy;
pub use java_main::JavaMain;
pub use manifest::JarManifest;
pub use spring_boot::SpringBoot;
pub use tomcat::Tomcat;

use crate::context::StagingContext;
use crate::plugin::Container;
use crate::registry::ArchetypeRegistry;
use anyhow::{Context, Result};
use std::sync::Arc;

pub const PRIORITY: u8 = 10;
pub const OWNER: &str = "container";

const BASE_OPTS: &str = "-Djava.io.tmpdir=$TMPDIR";

/// Every built-in container, in selection order
pub fn registry(context: &Arc<StagingContext>) -> ArchetypeRegistry<dyn Container> {
    ArchetypeRegistry::<dyn Container>::new("container")
        .with(Arc::new(SpringBoot::new(Arc::clone(context))))
        .with(Arc::new(Tomcat::new(Arc::clone(context))))
        .with(Arc::new(Groovy::new(Arc::clone(context))))
        .with(Arc::new(DistZip::new(Arc::clone(context))))
        .with(Arc::new(JavaMain::new(Arc::clone(context))))
}

/// Write the container's fragment: the shared base options plus `extra`
fn write_container_opts(context: &StagingContext, extra: &[String]) -> Result<()> {
    let mut opts = vec![BASE_OPTS.to_string()];
    opts.extend(extra.iter().cloned());
    context
        .opts()
        .write_fragment(PRIORITY, OWNER, &opts.join(" "))
        .context("Failed to write container options")?;
    Ok(())
}

/// Launch through the JRE selected for this build. `eval` lets options
/// such as `$TMPDIR` in `JAVA_OPTS` expand when the application starts.
fn java_command(args: &str) -> String {
    format!("eval exec $JAVA_HOME/bin/java $JAVA_OPTS {}", args)
}

/// Top-level application files with `extension`, sorted by name
fn top_level_files(context: &StagingContext, extension: &str) -> Vec<String> {
    context
        .fs()
        .files_with_extension(context.build_dir(), extension)
}

#[cfg(test)]
mod tests {
    use crate::context::test_support::context_with;
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::overrides::Overrides;
    use crate::plugin::Plugin;

    fn selected(fs: MockFileSystem) -> Option<String> {
        let context = context_with(fs, Overrides::default());
        registry(&context)
            .select()
            .map(|s| s.candidate.name().to_string())
    }

    #[test]
    fn test_registration_order() {
        let context = context_with(MockFileSystem::new(), Overrides::default());
        assert_eq!(
            registry(&context).names(),
            vec!["Spring Boot", "Tomcat", "Groovy", "Dist ZIP", "Java Main"]
        );
    }

    #[test]
    fn test_boot_inf_wins_over_main_class_manifest() {
        let fs = MockFileSystem::new();
        fs.add_dir("BOOT-INF/classes");
        fs.add_file(
            "META-INF/MANIFEST.MF",
            "Manifest-Version: 1.0\nMain-Class: org.springframework.boot.loader.JarLauncher\n",
        );
        assert_eq!(selected(fs).as_deref(), Some("Spring Boot"));
    }

    #[test]
    fn test_web_inf_wins_over_loose_jars() {
        let fs = MockFileSystem::new();
        fs.add_dir("WEB-INF/lib");
        fs.add_file("helper.jar", "");
        assert_eq!(selected(fs).as_deref(), Some("Tomcat"));
    }

    #[test]
    fn test_dist_zip_wins_over_jars_in_lib() {
        let fs = MockFileSystem::new();
        fs.add_file("bin/app", "#!/bin/sh\n");
        fs.add_file("bin/app.bat", "@echo off\n");
        fs.add_file("lib/app.jar", "");
        fs.add_file("app.jar", "");
        assert_eq!(selected(fs).as_deref(), Some("Dist ZIP"));
    }

    #[test]
    fn test_nothing_recognisable() {
        let fs = MockFileSystem::new();
        fs.add_file("index.html", "<html/>");
        assert!(selected(fs).is_none());
    }

    #[test]
    fn test_java_command() {
        assert_eq!(
            java_command("-jar app.jar"),
            "eval exec $JAVA_HOME/bin/java $JAVA_OPTS -jar app.jar"
        );
    }

    #[test]
    fn test_plugin_names_are_unique() {
        let context = context_with(MockFileSystem::new(), Overrides::default());
        let registry = registry(&context);
        let mut names: Vec<&str> = registry.candidates().iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.len());
    }
}
