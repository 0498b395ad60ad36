use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use reino::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for reino::AppCommand {
    fn from(cmd: Commands) -> reino::AppCommand {
        match cmd {
            Commands::Tiers => reino::AppCommand::Tiers,
            Commands::Compare { json } => reino::AppCommand::Compare { json },
            Commands::Simulate => reino::AppCommand::Simulate,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration (at --config-path if given)
    Setup,
    /// Display the flat advisory fee schedule
    Tiers,
    /// Compare advisory and traditional costs for each scenario
    Compare {
        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay each scenario's steps and show the resulting allocations
    Simulate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => reino::cli::setup::run(cli.config_path.as_deref()).map(|_| ()),
        Some(cmd) => reino::run_command(cmd.into(), cli.config_path.as_deref()),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
