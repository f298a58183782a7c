//! Identity Store adapters.

pub mod in_memory;
pub mod password;
pub mod seed;

use campus_core::AccountId;
use thiserror::Error;

pub use in_memory::InMemoryIdentityStore;
pub use password::CredentialHasher;
pub use seed::{demo_identity_store, DemoAccount, DEMO_ACCOUNTS};

/// Failures of the store's own write operations.
///
/// Reads go through `campus_auth::IdentityStore` and never fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityStoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("account not found: {0}")]
    NotFound(AccountId),

    #[error("invalid account record: {0}")]
    InvalidRecord(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("identity store lock poisoned")]
    Poisoned,
}
