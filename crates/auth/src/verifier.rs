use std::sync::Arc;

use async_trait::async_trait;

use crate::{Account, AuthError, Module, SessionToken};

/// A successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub account: Account,
    pub token: SessionToken,
    /// The module the session was opened for.
    pub module: Module,
}

/// Validates a username/password/module triple and issues a session token.
///
/// Implementations may suspend on network or database I/O and own their
/// timeout/retry policy; the engine sees only the outcome.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Errors: `ModuleNotSelected`, `InvalidCredentials` (unknown user,
    /// inactive account and wrong password are indistinguishable),
    /// `ModuleAccessDenied`, or `Unavailable`.
    async fn verify(
        &self,
        username: &str,
        password: &str,
        requested_module: &str,
    ) -> Result<Verified, AuthError>;
}

#[async_trait]
impl<T> CredentialVerifier for Arc<T>
where
    T: CredentialVerifier + ?Sized,
{
    async fn verify(
        &self,
        username: &str,
        password: &str,
        requested_module: &str,
    ) -> Result<Verified, AuthError> {
        (**self).verify(username, password, requested_module).await
    }
}
