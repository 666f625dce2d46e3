//! Process-wide tracing setup shared by the server binary and tests.

/// Initialize tracing with the format chosen by `LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;
