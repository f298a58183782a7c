//! Console client for the campus session engine.

pub mod backend;
pub mod console;

pub use backend::HttpAuthBackend;
pub use console::{AccountSummary, Console, StatusReport};
