//! javastage - staging pipeline for Java applications on a managed platform
//!
//! Staging turns an uploaded application directory into something the
//! platform can start: a Java runtime, any agents the bound services ask
//! for, a merged set of JVM options and a start command.
//!
//! # Core Concepts
//!
//! - **Plugins**: units with three operations, detect, install and
//!   configure ([`plugin::Plugin`]).
//! - **Archetype registries**: ordered candidate lists from which exactly
//!   one plugin is selected, first match wins ([`registry::ArchetypeRegistry`]).
//!   Containers (how the app is packaged) and JREs are selected this way.
//! - **Coordinator**: drives every active plugin through the three phases in
//!   lockstep ([`lifecycle::Coordinator`]). The container and JRE are
//!   mandatory; a failing framework is dropped and staging carries on.
//! - **Options fragments**: each plugin writes its JVM options to its own
//!   `NN_owner.opts` file. A start-time script merges them in priority order
//!   ([`opts`]).
//!
//! # Example Usage
//!
//! ```ignore
//! use javastage::context::StagingContext;
//! use javastage::installer::OfflineInstaller;
//! use javastage::layout::StagingLayout;
//! use javastage::lifecycle::Coordinator;
//! use std::sync::Arc;
//!
//! let layout = StagingLayout::new("/tmp/app", "/tmp/cache", "/tmp/deps", "0");
//! let installer = OfflineInstaller::load("/opt/buildpack")?;
//! let context = StagingContext::builder(layout, Arc::new(installer)).build();
//!
//! let report = Coordinator::with_defaults(Arc::new(context)).run()?;
//! println!("web: {}", report.command);
//! ```

pub mod cli;
pub mod config;
pub mod containers;
pub mod context;
pub mod error;
pub mod frameworks;
pub mod fs;
pub mod installer;
pub mod jres;
pub mod layout;
pub mod lifecycle;
pub mod opts;
pub mod overrides;
pub mod plugin;
pub mod progress;
pub mod registry;
pub mod release;
pub mod services;
pub mod util;

pub use config::{ConfigError, EnvSnapshot, StagingConfig};
pub use context::StagingContext;
pub use error::StagingError;
pub use lifecycle::{Coordinator, StagingReport};
pub use plugin::{Container, Jre, Plugin};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
