//! Structured logging via tracing.
//!
//! Logs always go to stderr so they never mix with rendered or sanitized markup on stdout.
//!
//! # Log Targets
//!
//! - `best_templatetags::sanitizer` - unwrapped elements, stripped attributes, parse errors
//! - `best_templatetags::filters` - filter fallbacks such as the inline diagnostic
//! - `config` - settings loading and installation
//!
//! # Environment Variables
//!
//! - `TEMPLATETAGS_LOG` - Primary log level/filter (takes precedence)
//! - `RUST_LOG` - Fallback log level/filter

use std::io;
use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT_GUARD: OnceLock<()> = OnceLock::new();

pub const LOG_ENV: &str = "TEMPLATETAGS_LOG";

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when neither environment variable is set.
    pub default_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to parse log filter: {0}")]
    FilterParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to initialize subscriber: {0}")]
    TryInit(#[from] tracing_subscriber::util::TryInitError),
}

fn build_env_filter(default_level: Level) -> Result<EnvFilter, LoggingError> {
    for var in [LOG_ENV, "RUST_LOG"].iter() {
        if let Ok(filter) = std::env::var(var) {
            return Ok(EnvFilter::try_new(filter)?);
        }
    }

    let default_filter = format!(
        "{level},config={level}",
        level = default_level.as_str().to_lowercase()
    );
    Ok(EnvFilter::try_new(default_filter)?)
}

/// Installs the global subscriber. Only the first call succeeds.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    if INIT_GUARD.set(()).is_err() {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = build_env_filter(config.default_level)?;
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}
