//! Tracing/logging (shared setup).

/// Initialize process-wide observability (JSON logs, `info` by default).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize with an explicit output format and default filter.
pub fn init_with(format: LogFormat, default_filter: &str) {
    tracing::init_with(format, default_filter);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat};
