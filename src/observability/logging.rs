//! Logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Resolves logging from settings plus the environment.
    ///
    /// Filter precedence: `RUST_LOG`, `SYMMEM_LOG`, the configured level,
    /// then `debug` with `verbose` or `info`. Format precedence:
    /// `SYMMEM_LOG_FORMAT`, then the configured format.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let default_level = if verbose { "debug" } else { "info" };
        let directive = lookup("RUST_LOG")
            .or_else(|| lookup("SYMMEM_LOG"))
            .or_else(|| settings.and_then(|s| s.level.clone()))
            .unwrap_or_else(|| default_level.to_string());
        let filter =
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(default_level));

        let format = lookup("SYMMEM_LOG_FORMAT")
            .map(|f| LogFormat::parse(&f))
            .or_else(|| settings.and_then(|s| s.format))
            .unwrap_or_default();

        Self {
            format,
            filter,
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}
