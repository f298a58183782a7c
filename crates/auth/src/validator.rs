use std::sync::Arc;

use async_trait::async_trait;

use crate::{Account, AuthError, SessionToken};

/// Recovers the account behind an opaque token.
///
/// `validate` is idempotent and side-effect free; it may run on every page
/// load.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Errors: `MalformedToken`, `ExpiredOrRevoked`, `AccountInactive`,
    /// `AccountNotFound`, or `Unavailable`.
    async fn validate(&self, token: &SessionToken) -> Result<Account, AuthError>;

    /// Best-effort server-side invalidation, used on logout.
    async fn revoke(&self, _token: &SessionToken) -> Result<(), AuthError> {
        Ok(())
    }
}

#[async_trait]
impl<T> TokenValidator for Arc<T>
where
    T: TokenValidator + ?Sized,
{
    async fn validate(&self, token: &SessionToken) -> Result<Account, AuthError> {
        (**self).validate(token).await
    }

    async fn revoke(&self, token: &SessionToken) -> Result<(), AuthError> {
        (**self).revoke(token).await
    }
}
