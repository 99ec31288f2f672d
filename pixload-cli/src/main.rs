//! pixload CLI - load local images through the pixload engine
//!
//! Each path becomes one request bound to a console surface. Results are
//! printed as they are delivered on the main context.

mod commands;
mod error;
mod orchestrator;
mod runner;
mod surface;
mod transform;

use clap::{Parser, Subcommand};
use commands::config::ConfigAction;
use commands::load::LoadArgs;

#[derive(Parser)]
#[command(name = "pixload")]
#[command(version = pixload::VERSION)]
#[command(about = "Load images through the pixload request engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one or more image files and report what each surface received
    Load(LoadArgs),
    /// Inspect loader configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    pixload::fault::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Load(args) => commands::load::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        e.exit();
    }
}
