//! CLI command implementations.
//!
//! - [`load`] - Load images into console surfaces
//! - [`config`] - Show the configuration path and effective settings

pub mod config;
pub mod load;
