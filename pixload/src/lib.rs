//! pixload - asynchronous image loading for display surfaces
//!
//! A load is described with a fluent builder, fingerprinted into a cache
//! key, run on a bounded worker pool, retried on transient failures, and
//! delivered back on the owning (UI) context. Display surfaces are held
//! weakly: a surface that goes away cancels its load silently.
//!
//! # Example
//!
//! ```ignore
//! use pixload::{Loader, LoaderContext, TokioRequestExecutor, main_channel};
//!
//! let (poster, mut main_loop) = main_channel();
//! let executor = TokioRequestExecutor::new(config.worker_threads())?;
//! let context = LoaderContext::builder(orchestrator, Arc::new(executor), Arc::new(poster))
//!     .with_config(config)
//!     .build();
//!
//! Loader::new(context)
//!     .load_file("/sdcard/cat.png")
//!     .resize(256, 256)
//!     .into_target(&surface);
//!
//! main_loop.next().await;
//! ```

pub mod bitmap;
pub mod coalesce;
pub mod config;
pub mod context;
pub mod delivery;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod fault;
pub mod key;
pub mod logging;
pub mod main_thread;
pub mod request;
pub mod retry;
pub mod source;
pub mod target;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use bitmap::{Bitmap, Drawable, LoadedFrom, ResourceId};
pub use config::LoaderConfig;
pub use context::{Loader, LoaderContext};
pub use error::{FailureKind, FetchError, LoaderError};
pub use executor::{RequestExecutor, TokioRequestExecutor};
pub use main_thread::{main_channel, ChannelPoster, MainLoop, MainThreadPoster};
pub use request::{Request, RequestBuilder, RequestHandle, RequestState};
pub use source::{DecodeOptions, ImageSource, Orchestrator, Transformation};
pub use target::{DisplaySurface, ImageSurface, TextSurface};

/// Version of the pixload library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
