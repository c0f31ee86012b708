//! Logging setup.
//!
//! Installs a `tracing` subscriber with an env filter, a stderr layer and an
//! optional daily-rotated log file.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise global logging.
///
/// `RUST_LOG` wins over `config.level` when set. The returned guard flushes
/// the file writer on drop and must be kept alive by the caller.
pub fn init(config: &LoggingConfig, debug: bool) -> Result<Option<WorkerGuard>> {
    let level = if debug { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("turing_arena={level},tower_http=warn,{level}")))
        .context("Invalid log filter")?;

    let stderr_layer = if config.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_target(false).with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            let prefix = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "turing-arena.log".to_string());
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;

            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Logging already initialised")?;

    tracing::debug!("Logging initialised (level={})", level);
    Ok(guard)
}
