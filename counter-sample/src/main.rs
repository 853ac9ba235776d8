use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use entity_bridge::logging::{self, LoggingMode};
use entity_bridge::StateAccess;

pub mod app;
pub mod script;

pub use script::{parse_script, Origin, Side, Step};

/// Entity Bridge Counter Sample
///
/// Bridges a counter model and a todo collection to one store, then runs a
/// script of actions against it from the store side, the entity side, or
/// both in turn.
#[derive(Parser, Debug)]
#[command(name = "counter-sample")]
#[command(about = "Counter and todo entities kept in sync with a reducer store")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Initial counter value
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    pub start: i64,

    /// Number of todos the collection starts with
    #[arg(short, long, default_value = "0")]
    pub items: usize,

    /// Comma separated actions, each `TYPE` or `TYPE=<json payload>`
    #[arg(long, default_value = "INCREMENT,INCREMENT,PUSH={\"title\":\"demo\"},DECREMENT,POP")]
    pub script: String,

    /// Side the actions are dispatched from
    #[arg(long, value_enum, default_value = "alternate")]
    pub side: Side,

    /// Hand out live entity handles instead of snapshots
    #[arg(long)]
    pub live_state: bool,

    /// Print the final state only
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        let steps = parse_script(&self.script).context("Invalid --script")?;
        if steps.is_empty() {
            return Err(anyhow::anyhow!("Script must contain at least one action"));
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub start: i64,
    pub items: usize,
    pub script: Vec<Step>,
    pub side: Side,
    pub state_access: StateAccess,
    pub quiet: bool,
    pub log_level: String,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        Ok(Self {
            start: args.start,
            items: args.items,
            script: parse_script(&args.script)?,
            side: args.side,
            state_access: if args.live_state {
                StateAccess::Live
            } else {
                StateAccess::Snapshot
            },
            quiet: args.quiet,
            log_level: args.log_level,
        })
    }
}

impl Config {
    /// Create configuration from command line arguments and environment variables
    pub fn from_env() -> Result<Self> {
        let mut args = Args::parse();

        if let Ok(start) = std::env::var("COUNTER_START") {
            args.start = start
                .parse()
                .context("Invalid COUNTER_START environment variable")?;
        }

        if let Ok(items) = std::env::var("COUNTER_ITEMS") {
            args.items = items
                .parse()
                .context("Invalid COUNTER_ITEMS environment variable")?;
        }

        if let Ok(script) = std::env::var("COUNTER_SCRIPT") {
            args.script = script;
        }

        if let Ok(side) = std::env::var("COUNTER_SIDE") {
            args.side = side
                .parse()
                .context("Invalid COUNTER_SIDE environment variable")?;
        }

        if let Ok(access) = std::env::var(entity_bridge::config::STATE_ACCESS_ENV) {
            let access: StateAccess = access
                .parse()
                .context("Invalid ENTITY_BRIDGE_STATE_ACCESS environment variable")?;
            args.live_state = access == StateAccess::Live;
        }

        if let Ok(log_level) = std::env::var("COUNTER_LOG_LEVEL") {
            args.log_level = log_level;
        }

        args.validate()?;

        Config::try_from(args)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Counter start: {}", self.start);
        info!("  Initial todos: {}", self.items);
        info!(
            "  Script: {}",
            self.script
                .iter()
                .map(Step::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!("  Side: {:?}", self.side);
        info!("  State access: {:?}", self.state_access);
        info!("  Log level: {}", self.log_level);
    }
}

fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to parse configuration")?;

    let mode = if config.quiet {
        LoggingMode::Silent
    } else {
        LoggingMode::Development
    };
    logging::init_logging_with_filter(mode, Some(&config.log_level))
        .context("Failed to initialize logging")?;

    config.print_summary();

    let app = app::App::new(config.start, config.items, config.state_access)?;
    match app.run(&config.script, config.side) {
        Ok(state) => {
            info!(
                notifications = app.notifications(),
                counter = ?app.counter_value(),
                todos = app.todo_count(),
                "Script completed"
            );
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Err(e) => {
            error!("Script failed: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
