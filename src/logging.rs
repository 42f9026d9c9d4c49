//! Logging to a file in the cache directory.
//!
//! The terminal belongs to the TUI, so events go to `<cache_dir>/genre-trends.log`
//! through a non-blocking writer. `GENRE_TRENDS_LOG` overrides the filter
//! (`EnvFilter` syntax); otherwise `[logging] level` from the config applies,
//! raised to debug for this crate by `--debug`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheManager, LOG_FILE};

pub const LOG_ENV_VAR: &str = "GENRE_TRENDS_LOG";

/// Filter directive used when `GENRE_TRENDS_LOG` is not set.
pub fn filter_directive(level: &str, debug: bool) -> String {
    if debug {
        format!("{},genre_trends=debug", level)
    } else {
        level.to_string()
    }
}

fn build_filter(level: &str, debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(filter_directive(level, debug)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns the `WorkerGuard` that must live until exit so buffered lines are flushed.
/// Returns `None` (logging disabled) when the log file cannot be created.
pub fn init(cache: &CacheManager, level: &str, debug_crate: bool) -> Option<WorkerGuard> {
    if let Err(e) = cache.ensure_cache_dir() {
        eprintln!(
            "Warning: could not create log directory {}: {}",
            cache.cache_dir().display(),
            e
        );
        return None;
    }

    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(cache.cache_dir())
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!(
                "Warning: could not open log file in {}: {}",
                cache.cache_dir().display(),
                e
            );
            return None;
        }
    };

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(file_layer)
        .with(build_filter(level, debug_crate))
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!(
        log_file = %cache.cache_file(LOG_FILE).display(),
        debug_crate,
        "logging initialized"
    );
    Some(guard)
}
