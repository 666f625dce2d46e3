//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event (production default).
    #[default]
    Json,
    /// Human-readable multi-line output for local runs.
    Pretty,
}

impl LogFormat {
    /// Read `LOG_FORMAT` (`json` | `pretty`); anything else means JSON.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("garbage")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" Pretty ")), LogFormat::Pretty);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init(LogFormat::Json);
        init(LogFormat::Pretty);
    }
}
