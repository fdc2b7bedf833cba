use javastage::cli::commands::{CliArgs, Commands};
use javastage::cli::handlers::{handle_compose, handle_detect, handle_release, handle_supply};
use javastage::config::StagingConfig;
use javastage::util::logging::parse_level;
use javastage::util::{init_logging, LoggingConfig};
use javastage::{NAME, VERSION};

use clap::Parser;
use std::process;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    let config = StagingConfig::from_env();
    init_logging(logging_config(&args, &config));

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);
    debug!("{}", config);

    let exit_code = match &args.command {
        Commands::Supply(supply_args) => handle_supply(supply_args, &config),
        Commands::Detect(detect_args) => handle_detect(detect_args, &config),
        Commands::Release(release_args) => handle_release(release_args),
        Commands::Compose(compose_args) => handle_compose(compose_args),
    };

    process::exit(exit_code);
}

/// Command-line flags win over `JAVASTAGE_LOG_LEVEL`
fn logging_config(args: &CliArgs, config: &StagingConfig) -> LoggingConfig {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };

    LoggingConfig {
        level,
        use_json: config.log_json,
        ..LoggingConfig::default()
    }
}
