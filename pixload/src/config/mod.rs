//! Loader configuration.
//!
//! [`LoaderConfig`] groups the settings every request shares: retry budget,
//! retry delay, worker pool size, and the debug-indicator switch. It can be
//! built in code or read from the `[loader]` section of an INI file.
//!
//! ```ini
//! [loader]
//! retry_count = 2
//! retry_delay_ms = 500
//! worker_threads = 4
//! debugging = false
//! ```

mod defaults;
mod file;
mod loader;
mod parser;

pub use defaults::{
    default_worker_threads, num_cpus, DEFAULT_DEBUGGING, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS,
    MAX_DEFAULT_WORKER_THREADS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use loader::LoaderConfig;
