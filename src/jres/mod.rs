//! Java runtime providers
//!
//! Exactly one JRE is selected per build. The specialised distributions only
//! detect when asked for, through `<PREFIX>_COMPONENTS` or their own override
//! variable. OpenJDK detects unconditionally and is registered last, so it is
//! the fallback.

mod provider;

pub use provider::{JreProvider, JreSpec, OPEN_JDK, SAP_MACHINE, ZING, ZULU};

use crate::context::StagingContext;
use crate::layout::{find_home, StagingLayout};
use crate::plugin::Jre;
use crate::registry::ArchetypeRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PRIORITY: u8 = 5;
pub const OWNER: &str = "jre";
pub const DEFAULT_JAVA_VERSION: u32 = 17;

/// Directory names a distribution may unpack into
const HOME_PREFIXES: &[&str] = &["jdk", "jre", "openjdk", "zulu", "zing", "sapmachine"];

/// Every built-in runtime provider, in selection order
pub fn registry(context: &Arc<StagingContext>) -> ArchetypeRegistry<dyn Jre> {
    [ZING, ZULU, SAP_MACHINE, OPEN_JDK]
        .into_iter()
        .fold(ArchetypeRegistry::<dyn Jre>::new("jre"), |registry, spec| {
            registry.with(Arc::new(JreProvider::new(spec, Arc::clone(context))))
        })
}

/// `JAVA_HOME` of whichever runtime was installed for this build
pub fn installed_java_home(layout: &StagingLayout) -> Option<PathBuf> {
    find_home(&layout.plugin_dir(OWNER), HOME_PREFIXES, "bin/java")
}

/// Major version from `<home>/release` (`JAVA_VERSION="1.8.0_392"` is 8,
/// `"17.0.9"` is 17). Unknown releases count as [`DEFAULT_JAVA_VERSION`].
pub fn java_major_version(home: &Path) -> u32 {
    fs::read_to_string(home.join("release"))
        .ok()
        .and_then(|content| {
            content.lines().find_map(|line| {
                let value = line.strip_prefix("JAVA_VERSION=")?.trim().trim_matches('"');
                parse_major(value)
            })
        })
        .unwrap_or(DEFAULT_JAVA_VERSION)
}

/// Major version of the runtime installed for this build
pub fn installed_major_version(layout: &StagingLayout) -> u32 {
    installed_java_home(layout)
        .map(|home| java_major_version(&home))
        .unwrap_or(DEFAULT_JAVA_VERSION)
}

fn parse_major(version: &str) -> Option<u32> {
    let mut parts = version.split(|c: char| c == '.' || c == '_' || c == '-' || c == '+');
    match parts.next()?.parse::<u32>().ok()? {
        1 => parts.next()?.parse().ok(),
        major => Some(major),
    }
}
