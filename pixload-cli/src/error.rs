//! CLI error handling with user-friendly messages.

use pixload::config::ConfigFileError;
use pixload::LoaderError;
use std::fmt;
use std::path::PathBuf;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be used
    Config {
        path: PathBuf,
        error: ConfigFileError,
    },
    /// Async runtime could not be started
    Runtime(std::io::Error),
    /// Worker pool could not be created
    Loader(LoaderError),
    /// Main loop closed before every request was delivered
    Incomplete { delivered: usize, expected: usize },
    /// One or more loads ended in the error fallback
    LoadsFailed { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config { path, .. } = self {
            eprintln!();
            eprintln!("Check the [loader] section of {}", path.display());
            eprintln!("Run 'pixload config show' to see the effective settings.");
        }

        let code = match self {
            CliError::LoadsFailed { .. } => 2,
            _ => 1,
        };
        process::exit(code)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config { path, error } => {
                write!(f, "Configuration error in '{}': {}", path.display(), error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Loader(e) => write!(f, "Failed to create loader: {}", e),
            CliError::Incomplete {
                delivered,
                expected,
            } => write!(
                f,
                "Main loop closed after {} of {} deliveries",
                delivered, expected
            ),
            CliError::LoadsFailed { failed, total } => {
                write!(f, "{} of {} images failed to load", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) | CliError::Runtime(e) => Some(e),
            CliError::Config { error, .. } => Some(error),
            CliError::Loader(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoaderError> for CliError {
    fn from(e: LoaderError) -> Self {
        CliError::Loader(e)
    }
}
