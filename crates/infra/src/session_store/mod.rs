//! Client-side Session Store adapters.

pub mod file;
pub mod in_memory;

pub use file::{default_session_path, FileSessionStore};
pub use in_memory::{InMemorySessionStore, RawSession};
