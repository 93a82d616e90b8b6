use std::path::PathBuf;
use std::process;

use ajax_route_validator::config::ConfigValidator;
use ajax_route_validator::shared::LoggingUtils;
use ajax_route_validator::{AppConfig, RouteCatalog};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "ajax-routes")]
#[command(about = "Inspect the configured AJAX routes", long_about = None)]
#[command(after_help = "Configuration is read from Conf.* (or --config) and AJAX_ROUTES__* variables.")]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// List the exposed AJAX routes
    List {
        /// Only routes of this controller
        #[arg(long)]
        controller: Option<String>,
    },
    /// Describe one route and its parameters
    Show {
        /// Route name
        route: String,

        /// Print every parameter property
        #[arg(short, long)]
        full: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load().context("Failed to load configuration")?,
    };
    ConfigValidator::validate_config(&config).context("Invalid route configuration")?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    LoggingUtils::initialize(&config.logging.level)?;
    debug!(routes = config.routes.len(), "Configuration loaded");

    let catalog = RouteCatalog::from_config(&config)?;
    match cli.command {
        Command::List { controller } => {
            print!("{}", catalog.render_list(controller.as_deref()));
        }
        Command::Show { route, full } => {
            print!("{}", catalog.describe(&route, full)?);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
