//! CLI runner for common setup.
//!
//! Loads configuration and initializes logging before a command runs.

use crate::error::CliError;
use pixload::config::config_file_path;
use pixload::logging::{init_logging, LoggingGuard, DEFAULT_LOG_FILE};
use pixload::LoaderConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Read the loader configuration from `path`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<(PathBuf, LoaderConfig), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    match LoaderConfig::load_from(&path) {
        Ok(config) => Ok((path, config)),
        Err(error) => Err(CliError::Config { path, error }),
    }
}

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: LoaderConfig,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// `debug_mode` raises the default log level to debug and turns on the
    /// provenance indicator.
    pub fn new(
        config_path: Option<&Path>,
        log_dir: &Path,
        debug_mode: bool,
    ) -> Result<Self, CliError> {
        let (path, config) = load_config(config_path)?;
        let config = if debug_mode {
            config.with_debugging(true)
        } else {
            config
        };

        let level = if debug_mode { "debug" } else { "info" };
        let logging_guard =
            init_logging(log_dir, DEFAULT_LOG_FILE, level).map_err(CliError::LoggingInit)?;

        info!("pixload v{}", pixload::VERSION);
        info!(config = %path.display(), log = %logging_guard.log_path().display(), "Configuration loaded");

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> LoaderConfig {
        self.config
    }
}
