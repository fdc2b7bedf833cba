//! Plugin lifecycle coordination
//!
//! A build runs three global phases. Every plugin finishes Detect before any
//! plugin installs, and every plugin finishes Install before any configures,
//! so a plugin may read what another wrote in an earlier phase but never
//! within the same one. Inside a phase plugins run in registration order:
//! the selected container, the selected JRE, then the frameworks.
//!
//! The container and the JRE are mandatory and abort the build when they
//! fail. Any other plugin that fails is logged, marked abandoned and skipped
//! for the remaining phases; the build carries on without its contribution.

mod coordinator;
mod phase;
mod report;

pub use coordinator::Coordinator;
pub use phase::Phase;
pub use report::{PluginRecord, PluginState, StagingReport};
