//! Configuration inspection commands.

use clap::Subcommand;
use std::path::PathBuf;

use crate::error::CliError;
use crate::runner::load_config;

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the default configuration file path
    Path,
    /// Print the effective loader settings
    Show {
        /// Configuration file to read instead of the default
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Path => {
            println!("{}", pixload::config::config_file_path().display());
            Ok(())
        }
        ConfigAction::Show { config } => {
            let (path, config) = load_config(config.as_deref())?;
            let exists = if path.exists() { "" } else { " (not found, defaults)" };
            println!("Config file:    {}{}", path.display(), exists);
            println!("[loader]");
            println!("retry_count    = {}", config.retry_count());
            println!("retry_delay_ms = {}", config.retry_delay().as_millis());
            println!("worker_threads = {}", config.worker_threads());
            println!("debugging      = {}", config.debugging());
            Ok(())
        }
    }
}
