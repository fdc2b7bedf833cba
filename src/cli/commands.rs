use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stage Java applications for a managed application platform
#[derive(Parser, Debug)]
#[command(
    name = "javastage",
    about = "Stage Java applications for a managed application platform",
    version,
    long_about = "javastage detects how a Java application is packaged, installs a Java \
                  runtime and any requested agents, and records the command that starts \
                  the application. JVM options contributed by each plugin are merged when \
                  the application starts."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect, install and configure everything the application needs",
        long_about = "Runs the full staging pipeline against the application directory and \
                      writes the release descriptor.\n\n\
                      Examples:\n  \
                      javastage supply /tmp/app /tmp/cache /tmp/deps 0"
    )]
    Supply(SupplyArgs),

    #[command(
        about = "Report the packaging archetype and Java runtime that would be selected",
        long_about = "Runs detection only. Exits with status 10 when the application is not a \
                      recognised Java application.\n\n\
                      Examples:\n  \
                      javastage detect /tmp/app\n  \
                      javastage detect /tmp/app --format json"
    )]
    Detect(DetectArgs),

    #[command(about = "Print the release descriptor written by supply")]
    Release(ReleaseArgs),

    #[command(
        about = "Merge the JVM options fragments the way the start script does",
        long_about = "Reads DEPS_DIR placeholders from --deps-dir and HOME and JAVA_OPTS from \
                      the environment, then prints the merged JAVA_OPTS value.\n\n\
                      Examples:\n  \
                      javastage compose --deps-dir /home/vcap/deps --idx 0"
    )]
    Compose(ComposeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SupplyArgs {
    #[arg(value_name = "BUILD_DIR", help = "Application directory")]
    pub build_dir: PathBuf,

    #[arg(value_name = "CACHE_DIR", help = "Cache directory kept between stagings")]
    pub cache_dir: PathBuf,

    #[arg(value_name = "DEPS_DIR", help = "Shared dependencies directory")]
    pub deps_dir: PathBuf,

    #[arg(value_name = "DEPS_IDX", help = "Index of this stage within DEPS_DIR")]
    pub deps_idx: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "BUILD_DIR", help = "Application directory")]
    pub build_dir: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ReleaseArgs {
    #[arg(value_name = "BUILD_DIR", help = "Application directory")]
    pub build_dir: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ComposeArgs {
    #[arg(long, value_name = "DIR", help = "Shared dependencies directory")]
    pub deps_dir: PathBuf,

    #[arg(long, value_name = "IDX", help = "Index of the stage that wrote the fragments")]
    pub idx: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}
