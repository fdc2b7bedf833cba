//! Subcommand handlers
//!
//! Each `handle_*` function returns the process exit code. Machine-readable
//! output goes to stdout; diagnostics go through tracing to stderr.

use super::commands::{ComposeArgs, DetectArgs, OutputFormatArg, ReleaseArgs, SupplyArgs};
use crate::config::{ConfigError, EnvSnapshot, StagingConfig};
use crate::context::StagingContext;
use crate::error::{exit_code, StagingError};
use crate::frameworks;
use crate::installer::{Manifest, OfflineInstaller};
use crate::layout::{StagingLayout, OPTS_DIR_NAME};
use crate::lifecycle::{Coordinator, StagingReport};
use crate::opts::{compose_dir, RuntimeEnv};
use crate::progress::LoggingHandler;
use crate::release;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What `detect` found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub container: String,
    pub jre: String,
    pub frameworks: Vec<String>,
}

impl Detection {
    fn to_human(&self) -> String {
        let mut out = format!("container: {}\njre: {}\n", self.container, self.jre);
        if !self.frameworks.is_empty() {
            out.push_str(&format!("frameworks: {}\n", self.frameworks.join(", ")));
        }
        out
    }
}

fn require_build_dir(build_dir: &Path) -> Result<(), ConfigError> {
    if build_dir.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::MissingBuildDir(build_dir.to_path_buf()))
    }
}

fn validate_deps_idx(deps_idx: &str) -> Result<(), ConfigError> {
    if !deps_idx.is_empty() && deps_idx.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(format!(
            "Invalid dependency index '{}': expected a non-negative integer",
            deps_idx
        )))
    }
}

/// Run the full staging pipeline
pub fn supply(
    args: &SupplyArgs,
    config: &StagingConfig,
    snapshot: &EnvSnapshot,
) -> Result<StagingReport, StagingError> {
    config.validate()?;
    require_build_dir(&args.build_dir)?;
    validate_deps_idx(&args.deps_idx)?;
    config.require_manifest()?;

    let installer = OfflineInstaller::load(&config.buildpack_dir)
        .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;
    debug!(
        dependencies = installer.manifest().dependencies.len(),
        "Loaded dependency manifest"
    );

    let layout = StagingLayout::new(
        &args.build_dir,
        &args.cache_dir,
        &args.deps_dir,
        args.deps_idx.as_str(),
    );
    let context = StagingContext::from_snapshot(layout, snapshot, Arc::new(installer));

    Coordinator::with_defaults(Arc::new(context))
        .with_progress(Arc::new(LoggingHandler))
        .run()
}

pub fn handle_supply(args: &SupplyArgs, config: &StagingConfig) -> i32 {
    info!(build_dir = %args.build_dir.display(), "Staging application");
    let snapshot = EnvSnapshot::capture(&config.override_prefix);

    match supply(args, config, &snapshot) {
        Ok(report) => {
            for record in report.abandoned() {
                warn!(plugin = %record.name, "Plugin was abandoned during staging");
            }
            info!(command = %report.command, "Staging complete");
            exit_code::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}

/// Select the container and JRE without installing anything
pub fn detect(
    args: &DetectArgs,
    config: &StagingConfig,
    snapshot: &EnvSnapshot,
) -> Result<Detection, StagingError> {
    config.validate()?;
    require_build_dir(&args.build_dir)?;

    let layout = StagingLayout::for_build_dir(&args.build_dir);
    // Detection never installs, so an empty manifest is enough
    let installer = OfflineInstaller::new(&config.buildpack_dir, Manifest::default());
    let context = Arc::new(StagingContext::from_snapshot(
        layout,
        snapshot,
        Arc::new(installer),
    ));

    let (container, jre) = Coordinator::with_defaults(Arc::clone(&context)).select()?;

    let frameworks = frameworks::all(&context)
        .iter()
        .filter_map(|framework| match framework.detect() {
            Ok(label) => label,
            Err(e) => {
                warn!(plugin = framework.name(), error = %e, "Detection failed");
                None
            }
        })
        .collect();

    Ok(Detection {
        container: container.label,
        jre: jre.label,
        frameworks,
    })
}

pub fn handle_detect(args: &DetectArgs, config: &StagingConfig) -> i32 {
    let snapshot = EnvSnapshot::capture(&config.override_prefix);

    let detection = match detect(args, config, &snapshot) {
        Ok(detection) => detection,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        }
    };

    match args.format {
        OutputFormatArg::Human => print!("{}", detection.to_human()),
        OutputFormatArg::Json => match serde_json::to_string_pretty(&detection) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to format detection result: {}", e);
                return exit_code::INTERNAL;
            }
        },
    }
    exit_code::SUCCESS
}

pub fn handle_release(args: &ReleaseArgs) -> i32 {
    let path = StagingLayout::for_build_dir(&args.build_dir).release_file();
    match release::read_verbatim(&path) {
        Ok(content) => {
            print!("{}", content);
            exit_code::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}

/// Merge the fragments under `<deps_dir>/<idx>` with `env`
pub fn compose(args: &ComposeArgs, env: &RuntimeEnv) -> Result<String, StagingError> {
    validate_deps_idx(&args.idx)?;
    let dir = args.deps_dir.join(&args.idx).join(OPTS_DIR_NAME);
    Ok(compose_dir(&dir, env)?)
}

pub fn handle_compose(args: &ComposeArgs) -> i32 {
    let env = RuntimeEnv {
        deps_dir: args.deps_dir.display().to_string(),
        ..RuntimeEnv::from_process()
    };

    match compose(args, &env) {
        Ok(java_opts) => {
            println!("{}", java_opts);
            exit_code::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}
