use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use watchman_engine::{AnalysisApi, ReqwestApi, ServiceMode};
use watchman_logging::{level_from_verbosity, watch_info, LogDestination};

use crate::platform::app::{run_session, Outcome, Session};
use crate::platform::config::{AppConfig, DEFAULT_CONFIG_FILENAME};
use crate::platform::effects::EffectRunner;
use crate::platform::selection::load_video;

const LOG_FILENAME: &str = "watchman.log";

#[derive(Debug, Parser)]
#[command(
    name = "watchman",
    version,
    about = "Submit footage to the Watchman analysis service and control live saving"
)]
pub struct Cli {
    /// Config file (RON); defaults to ./watchman.ron
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the analysis service, overriding the config
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory downloads are written to, overriding the config
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a video and wait for the processed result
    Upload {
        file: PathBuf,
        /// Treat the service as synchronous (upload answers with a stored path)
        #[arg(long)]
        sync: bool,
    },
    /// Live camera session
    Live {
        #[command(subcommand)]
        action: LiveAction,
    },
    /// Footage segments saved by the live session
    Footages {
        #[command(subcommand)]
        action: FootageAction,
    },
    /// Write a config file with the default values
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum LiveAction {
    /// Show whether matching footage is being saved
    Status,
    /// Switch saving of matching footage on or off
    Toggle,
    /// Print the live feed URL for an external viewer
    Feed,
}

#[derive(Debug, Subcommand)]
pub enum FootageAction {
    /// List saved segments
    List,
    /// Download one saved segment into the output directory
    Fetch { name: String },
}

pub fn run(args: Cli) -> Result<ExitCode> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));

    if let Command::InitConfig { force } = args.command {
        AppConfig::write_defaults(&config_path, force)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = effective_config(&args, &config_path)?;
    start_logging(config.log_destination, args.verbose, Path::new(LOG_FILENAME));
    watch_info!(
        "watchman {} talking to {}{}",
        env!("CARGO_PKG_VERSION"),
        config.base_url,
        config.api_prefix
    );

    let session = match args.command {
        Command::Upload { file, .. } => Session::Upload(load_video(&file)?),
        Command::Live { action } => match action {
            LiveAction::Status => Session::LiveStatus,
            LiveAction::Toggle => Session::LiveToggle,
            LiveAction::Feed => {
                let api = ReqwestApi::new(config.client_settings())?;
                println!("{}", api.live_feed_url()?);
                return Ok(ExitCode::SUCCESS);
            }
        },
        Command::Footages { action } => match action {
            FootageAction::List => Session::FootageList,
            FootageAction::Fetch { name } => Session::FootageFetch(name),
        },
        Command::InitConfig { .. } => return Ok(ExitCode::SUCCESS),
    };

    let runner = EffectRunner::new(config.client_settings(), config.output_dir.clone())
        .context("failed to start the network engine")?;
    Ok(match run_session(session, &runner) {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::Failure => ExitCode::FAILURE,
    })
}

/// Installs the logger; says so on stderr when nothing could be installed.
fn start_logging(destination: LogDestination, verbosity: u8, log_path: &Path) -> bool {
    let installed =
        watchman_logging::initialize(destination, level_from_verbosity(verbosity), log_path);
    if !installed {
        eprintln!(
            "Warning: logging is disabled ({:?} output to {:?} could not be set up)",
            destination, log_path
        );
    }
    installed
}

/// Config file values with command-line overrides applied.
fn effective_config(args: &Cli, config_path: &Path) -> Result<AppConfig> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Command::Upload { sync: true, .. } = args.command {
        config.service_mode = ServiceMode::Sync;
    }
    Ok(config)
}
