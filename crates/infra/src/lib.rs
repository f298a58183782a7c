//! Infrastructure layer: concrete Identity Store and Session Store adapters.

pub mod identity;
pub mod session_store;

pub use identity::{
    demo_identity_store, CredentialHasher, DemoAccount, IdentityStoreError, InMemoryIdentityStore,
    DEMO_ACCOUNTS,
};
pub use session_store::{default_session_path, FileSessionStore, InMemorySessionStore, RawSession};
