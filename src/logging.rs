//! Logging configuration and initialization for refsearch.
//!
//! Provides rolling file logging and optional stderr output.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const DEFAULT_STDERR_FILTER: &str = "refsearch=info";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flushes pending log writes when dropped; keep it alive for the whole
/// program.
#[must_use = "Dropping this guard will stop logging - keep it alive for the program's lifetime"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Initialize the global subscriber from `config`.
///
/// Relative log directories are resolved against `project_root`.
pub fn init_logging(config: &LoggingConfig, project_root: &Path) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    if config.enabled {
        let (layer, guard) = file_layer(config, project_root)?;
        layers.push(layer);
        guards.push(guard);
    }

    if config.stderr {
        let (layer, guard) = stderr_layer();
        layers.push(layer);
        guards.push(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to initialize logging subscriber")?;

    Ok(LoggingGuard { _guards: guards })
}

fn file_layer(config: &LoggingConfig, project_root: &Path) -> Result<(BoxedLayer, WorkerGuard)> {
    let log_dir = resolve_log_dir(&config.directory, project_root);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let appender = RollingFileAppender::new(
        parse_rotation(&config.rotation),
        &log_dir,
        &config.file_prefix,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(parse_level(&config.level))
        .boxed();

    Ok((layer, guard))
}

fn stderr_layer() -> (BoxedLayer, WorkerGuard) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_filter(filter)
        .boxed();

    (layer, guard)
}

fn resolve_log_dir(directory: &Path, project_root: &Path) -> PathBuf {
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        project_root.join(directory)
    }
}

fn parse_level(level: &str) -> EnvFilter {
    let level = level.to_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {
            EnvFilter::new(format!("refsearch={}", level))
        }
        _ => {
            eprintln!("Warning: Unknown log level '{}', defaulting to 'debug'", level);
            EnvFilter::new("refsearch=debug")
        }
    }
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation.to_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        "never" => Rotation::NEVER,
        _ => {
            eprintln!(
                "Warning: Unknown rotation strategy '{}', defaulting to 'daily'",
                rotation
            );
            Rotation::DAILY
        }
    }
}

/// Stderr-only logging for use before the config is loaded.
pub fn init_early_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER)),
        )
        .with(fmt::layer().with_target(false))
        .try_init();
}
