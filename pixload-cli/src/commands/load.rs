//! The `load` command.

use clap::Args;
use image::Rgba;
use pixload::coalesce::CoalescingOrchestrator;
use pixload::logging::DEFAULT_LOG_DIR;
use pixload::main_channel;
use pixload::telemetry::TracingTelemetrySink;
use pixload::{
    Bitmap, DisplaySurface, Drawable, Loader, LoaderConfig, LoaderContext, TokioRequestExecutor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::CliError;
use crate::orchestrator::LocalOrchestrator;
use crate::runner::CliRunner;
use crate::surface::ConsoleSurface;
use crate::transform::Grayscale;

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Image files to load
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Configuration file to read instead of the default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging and provenance indicators
    #[arg(long)]
    debug: bool,

    /// Bypass the in-memory cache
    #[arg(long)]
    skip_cache: bool,

    /// Deliver without a fade-in
    #[arg(long)]
    no_fade: bool,

    /// Resize every image, e.g. 256x256
    #[arg(long, value_parser = parse_size)]
    resize: Option<(u32, u32)>,

    /// Convert every image to grayscale
    #[arg(long)]
    grayscale: bool,

    /// Directory for the session log
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
}

pub fn run(args: LoadArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), &args.log_dir, args.debug)?;
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let surfaces = runtime.block_on(load_all(&args, runner.config()))?;

    let failed = surfaces.iter().filter(|s| !s.succeeded()).count();
    info!(total = surfaces.len(), failed = failed, "Load finished");
    if failed > 0 {
        return Err(CliError::LoadsFailed {
            failed,
            total: surfaces.len(),
        });
    }
    Ok(())
}

async fn load_all(
    args: &LoadArgs,
    config: LoaderConfig,
) -> Result<Vec<Arc<ConsoleSurface>>, CliError> {
    let (poster, mut main_loop) = main_channel();
    let executor = TokioRequestExecutor::new(config.worker_threads())?;
    let orchestrator = CoalescingOrchestrator::new(LocalOrchestrator::new());
    let context =
        LoaderContext::builder(Arc::new(orchestrator), Arc::new(executor), Arc::new(poster))
            .with_telemetry(Arc::new(TracingTelemetrySink))
            .with_config(config)
            .build();
    let loader = Loader::new(context);
    let fallback =
        Drawable::new(Bitmap::solid(1, 1, Rgba([255, 0, 0, 255]))).with_label("error image");

    let mut surfaces = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let surface = Arc::new(ConsoleSurface::new(path.display().to_string()));
        let target: Arc<dyn DisplaySurface> = surface.clone();

        let mut request = loader.load_file(path.clone()).error_image(fallback.clone());
        if let Some((width, height)) = args.resize {
            request = request.resize(width, height);
        }
        if args.grayscale {
            request = request.transform(Arc::new(Grayscale));
        }
        if args.skip_cache {
            request = request.skip_cache();
        }
        if args.no_fade {
            request = request.no_fade();
        }
        let handle = request.into_target(&target);
        info!(surface = surface.name(), key = ?handle.key(), "Submitted");
        surfaces.push(surface);
    }

    // Surfaces are alive until the end, so every request delivers exactly once.
    let expected = surfaces.len();
    let delivered = main_loop.run_for(expected).await;
    if delivered < expected {
        return Err(CliError::Incomplete {
            delivered,
            expected,
        });
    }
    Ok(surfaces)
}

/// Parses `WIDTHxHEIGHT`.
fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let parse = |part: &str| -> Result<u32, String> {
        match part.trim().parse::<u32>() {
            Ok(0) => Err("dimensions must be positive".to_string()),
            Ok(n) => Ok(n),
            Err(e) => Err(format!("invalid dimension '{}': {}", part, e)),
        }
    };
    Ok((parse(width)?, parse(height)?))
}
