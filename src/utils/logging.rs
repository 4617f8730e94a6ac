//! Logging setup for the relay binary and tests.
//!
//! `RUST_LOG` wins when it is set; otherwise the level from
//! `settings.logging.level` applies to everything.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map a configured level name onto a filter. Unknown names fall back to
/// `INFO`.
pub fn level_filter(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// Filter built from `RUST_LOG`, falling back to `configured_level`.
/// Invalid `RUST_LOG` directives are skipped.
pub fn env_filter(configured_level: &str) -> EnvFilter {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::builder().parse_lossy(directives)
        }
        _ => EnvFilter::builder()
            .with_default_directive(level_filter(configured_level).into())
            .parse_lossy(""),
    }
}

/// Install the global tracing subscriber.
///
/// Uses `try_init`, so a second call is a no-op rather than a panic.
pub fn init(configured_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(configured_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
