//! Process-wide `tracing` setup for the feed binaries.
//!
//! The subscriber is configured entirely from environment variables so the
//! same binary can log human-readable output on a terminal and JSON to a
//! rolling file when run as a service:
//!
//! - `FEED_LOG_LEVEL`: filter directive used when `RUST_LOG` is unset (default `info`)
//! - `FEED_LOG_FORMAT`: `human` or `json` (default `human`)
//! - `FEED_LOG_OUTPUT`: `console`, `file` or `both` (default `console`)
//! - `FEED_LOG_FILE`: log file path (default `<tmp>/feed-server.log`, rotated daily)

use std::{env, path::PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
}

impl LogOutput {
    fn console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file: PathBuf,
}

impl LoggingConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unknown values fall back
    /// to the defaults rather than failing startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup("FEED_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let format = match lookup("FEED_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };

        let output = match lookup("FEED_LOG_OUTPUT").as_deref() {
            Some("file") => LogOutput::File,
            Some("both") => LogOutput::Both,
            _ => LogOutput::Console,
        };

        let file = lookup("FEED_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("feed-server.log"));

        Self {
            level,
            format,
            output,
            file,
        }
    }
}

fn fmt_layer<W>(writer: W, format: LogFormat, ansi: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Human => layer.boxed(),
    }
}

/// Initializes the global tracing subscriber based on environment variables.
///
/// The returned guard flushes the background file writer on drop and must be
/// held for the lifetime of the process when file output is enabled.
pub fn init_subscriber() -> Option<WorkerGuard> {
    init_with(LoggingConfig::from_env())
}

/// Initializes the global tracing subscriber from explicit settings.
pub fn init_with(config: LoggingConfig) -> Option<WorkerGuard> {
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    for directive in ["tokio=warn", "hyper=warn", "tower_http=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if config.output.console() {
        layers.push(fmt_layer(std::io::stdout, config.format, true));
    }

    if config.output.file() {
        let log_dir = config
            .file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);
        let log_filename = config
            .file
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "feed-server.log".into());

        let appender = tracing_appender::rolling::daily(log_dir, log_filename);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        layers.push(fmt_layer(non_blocking, config.format, false));
    }

    if let Err(e) = registry().with(layers).with(env_filter).try_init() {
        eprintln!("Logging already initialized: {e}");
    }

    guard
}
