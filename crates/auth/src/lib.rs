//! `campus-auth`: session and module-scoped authorization engine.
//!
//! The resolvers (`permissions`, `landing`, `guard`) are pure functions over
//! a [`SessionSnapshot`]. The [`SessionMachine`] owns the mutable session and
//! talks to the outside world only through the [`CredentialVerifier`],
//! [`TokenValidator`] and [`SessionStore`] boundaries.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod account;
pub mod authority;
pub mod capability;
pub mod error;
pub mod explain;
pub mod grant;
pub mod guard;
pub mod identity;
pub mod landing;
pub mod machine;
pub mod module;
pub mod permissions;
pub mod session;
pub mod storage;
pub mod token;
pub mod validator;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use account::{Account, Role};
pub use authority::StoreAuthority;
pub use capability::Capability;
pub use error::AuthError;
pub use explain::{explain, AccessExplanation, GrantSummary, SubjectState};
pub use grant::{ModuleGrant, ModuleGrants};
pub use guard::{check, AccessDecision, AccessRequest};
pub use identity::IdentityStore;
pub use landing::{account_landing_module, resolve_landing_module, LandingPolicy};
pub use machine::SessionMachine;
pub use module::Module;
pub use permissions::{accessible_modules, has_capability, has_module_access};
pub use session::{SessionSnapshot, SessionStatus};
pub use storage::{PersistedSession, SessionStore};
pub use token::{Hs256TokenCodec, SessionClaims, SessionToken, TokenCodec, TokenRejection};
pub use validator::TokenValidator;
pub use verifier::{CredentialVerifier, Verified};
