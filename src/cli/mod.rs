//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod check;
mod inspect;
mod route;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{load_config, merge_cli_overrides, AssetPipeConfig, CliOverrides};
use crate::subid::OverflowPolicy;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// assetpipe - Route, fingerprint and inspect asset builds
#[derive(Parser)]
#[command(name = "assetpipe")]
#[command(about = "assetpipe - Route sources to builders, run their jobs and inspect products")]
#[command(version)]
pub struct Cli {
    /// Path to assetpipe.toml (default: search upward from the current directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only build for these platforms (repeatable)
    #[arg(long = "platform", global = true, value_name = "ID")]
    pub platforms: Vec<String>,

    /// Product cache directory (default: from config)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache: Option<PathBuf>,

    /// Parent of per-job scratch directories (default: from config)
    #[arg(long, global = true, value_name = "DIR")]
    pub temp: Option<PathBuf>,

    /// Sub id overflow policy
    #[arg(long, global = true, value_enum)]
    pub overflow: Option<OverflowArg>,

    /// Hashing read buffer size in bytes
    #[arg(long, global = true, value_name = "BYTES")]
    pub hash_buffer_size: Option<usize>,

    /// Delay between hashed chunks in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub hash_delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OverflowArg {
    Truncate,
    Reject,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Truncate => OverflowPolicy::Truncate,
            OverflowArg::Reject => OverflowPolicy::Reject,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the recognizers whose patterns claim a source path
    Route {
        /// Source path, relative to its watch folder
        path: String,
    },

    /// Print the content hash of one or more files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Infer the legacy asset type and sub id of product files
    Infer {
        /// Product files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate assetpipe.toml
    Check,

    /// Run CreateJobs for a source through every matching recognizer
    Jobs {
        /// Source path, relative to the watch folder
        source: String,

        /// Watch folder the source lives under (default: project root)
        #[arg(long, value_name = "DIR")]
        watch_folder: Option<PathBuf>,
    },

    /// Create and process every job for a source and cache its products
    Build {
        /// Source path, relative to the watch folder
        source: String,

        /// Watch folder the source lives under (default: project root)
        #[arg(long, value_name = "DIR")]
        watch_folder: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            cache: self.cache.clone(),
            temp: self.temp.clone(),
            platforms: if self.platforms.is_empty() { None } else { Some(self.platforms.clone()) },
            overflow: self.overflow.map(OverflowPolicy::from),
            hash_buffer_size: self.hash_buffer_size,
            hash_delay_ms: self.hash_delay_ms,
        }
    }

    /// Load the configuration and apply command-line overrides.
    fn load_config(&self) -> Result<AssetPipeConfig, ExitCode> {
        match load_config(self.config.as_deref()) {
            Ok(mut config) => {
                merge_cli_overrides(&mut config, &self.overrides());
                Ok(config)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Err(ExitCode::from(EXIT_ERROR))
            }
        }
    }
}

fn init_logging(verbose: u8) {
    use env_logger::{Builder, Env};

    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Route { ref path } => route::run_route(&config, path),
        Commands::Hash { ref files, json } => inspect::run_hash(&config, files, json),
        Commands::Infer { ref files, json } => inspect::run_infer(files, json),
        Commands::Check => check::run_check(&config),
        Commands::Jobs { ref source, ref watch_folder } => {
            route::run_jobs(&config, cli.config.as_deref(), source, watch_folder.as_deref())
        }
        Commands::Build { ref source, ref watch_folder } => {
            build::run_build(&config, cli.config.as_deref(), source, watch_folder.as_deref())
        }
    }
}
