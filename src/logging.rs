//! Structured logging bootstrap, mirroring the noise-reduction directives a
//! long-running async server needs regardless of which transport it exposes.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Minimum level a caller wants, before the fixed per-crate overrides below
/// are layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Initializes the global `tracing` subscriber once per process.
///
/// `RUST_LOG`, if set, takes precedence over `level`. Either way a handful of
/// chatty dependency targets are pinned to `warn` so sandbox and catalog
/// traffic isn't drowned out.
pub fn init(level: LogLevel, json: bool) {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| level.as_str().to_string());
    let directives = format!("{base},hyper=warn,h2=warn,sqlx=warn,warp::filters=warn");
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(err) = result {
        eprintln!("logging already initialized: {err}");
    }
}
