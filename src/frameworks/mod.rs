//! Optional framework plugins
//!
//! Frameworks run after the container and JRE in every phase. Each one owns
//! a fixed priority slot in the options fragment directory; a framework that
//! fails to install or configure is dropped without affecting the others.

mod debug;
mod introscope;
mod java_opts;
mod jmx;
mod jprofiler;
mod jrebel;
mod sealights;
mod seeker;
mod takipi;
mod your_kit;

pub use debug::JavaDebug;
pub use introscope::IntroscopeAgent;
pub use java_opts::JavaOpts;
pub use jmx::Jmx;
pub use jprofiler::JProfilerProfiler;
pub use jrebel::JRebelAgent;
pub use sealights::SealightsAgent;
pub use seeker::SeekerSecurityProvider;
pub use takipi::TakipiAgent;
pub use your_kit::YourKitProfiler;

use crate::context::StagingContext;
use crate::plugin::Plugin;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Every built-in framework, in priority order
pub fn all(context: &Arc<StagingContext>) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(SeekerSecurityProvider::new(Arc::clone(context))),
        Arc::new(JavaDebug::new(Arc::clone(context))),
        Arc::new(IntroscopeAgent::new(Arc::clone(context))),
        Arc::new(SealightsAgent::new(Arc::clone(context))),
        Arc::new(TakipiAgent::new(Arc::clone(context))),
        Arc::new(Jmx::new(Arc::clone(context))),
        Arc::new(JRebelAgent::new(Arc::clone(context))),
        Arc::new(JProfilerProfiler::new(Arc::clone(context))),
        Arc::new(YourKitProfiler::new(Arc::clone(context))),
        Arc::new(JavaOpts::new(Arc::clone(context))),
    ]
}

fn write_opts(context: &StagingContext, priority: u8, owner: &str, opts: &[String]) -> Result<()> {
    context
        .opts()
        .write_fragment(priority, owner, &opts.join(" "))
        .with_context(|| format!("Failed to write {} options", owner))?;
    Ok(())
}

/// First file under `dir`, in name order at each level, whose name satisfies `wanted`
fn find_file(dir: &Path, wanted: impl Fn(&str) -> bool) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| wanted(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.into_path())
}
