//! Credential verification and token validation backed by an Identity Store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::permissions::has_module_access;
use crate::{
    Account, AuthError, CredentialVerifier, IdentityStore, Module, SessionToken, TokenCodec,
    TokenValidator, Verified,
};

/// Why a credential check failed. Logged, never returned.
#[derive(Debug, Clone, Copy)]
enum CredentialFailure {
    Blank,
    UnknownUser,
    Inactive,
    WrongPassword,
}

/// Local authority: verifies credentials against an [`IdentityStore`] and
/// issues/decodes tokens with a [`TokenCodec`].
///
/// This is the "implemented" side of the token exchange; the HTTP API wraps
/// it, and tests use it in-process. Password checks run on tokio's blocking
/// pool, so `verify` needs a tokio runtime.
pub struct StoreAuthority<S> {
    store: Arc<S>,
    codec: Arc<dyn TokenCodec>,
}

impl<S: IdentityStore> StoreAuthority<S> {
    pub fn new(store: S, codec: Arc<dyn TokenCodec>) -> Self {
        Self {
            store: Arc::new(store),
            codec,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Every non-blank attempt costs exactly one password check, whichever way it
/// fails: unknown usernames are checked against nothing and the active flag is
/// read only after the password.
fn check_credentials<S: IdentityStore>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<Account, CredentialFailure> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(CredentialFailure::Blank);
    }
    let account = store.find_account_by_username(username.trim());
    if !store.verify_password(account.as_ref(), password) {
        return Err(match account {
            Some(_) => CredentialFailure::WrongPassword,
            None => CredentialFailure::UnknownUser,
        });
    }
    match account {
        Some(account) if store.is_active(&account) => Ok(account),
        Some(_) => Err(CredentialFailure::Inactive),
        None => Err(CredentialFailure::UnknownUser),
    }
}

#[async_trait]
impl<S: IdentityStore + 'static> CredentialVerifier for StoreAuthority<S> {
    async fn verify(
        &self,
        username: &str,
        password: &str,
        requested_module: &str,
    ) -> Result<Verified, AuthError> {
        if requested_module.trim().is_empty() {
            return Err(AuthError::ModuleNotSelected);
        }
        let module: Module = requested_module.parse().map_err(|_| {
            tracing::debug!(requested_module, "login for unrecognised module");
            AuthError::ModuleNotSelected
        })?;

        let store = Arc::clone(&self.store);
        let (username, password) = (username.to_string(), password.to_string());
        let checked = tokio::task::spawn_blocking(move || check_credentials(&*store, &username, &password))
            .await
            .map_err(|e| AuthError::unavailable(format!("credential check did not finish: {e}")))?;

        let account = checked.map_err(|cause| {
            tracing::debug!(?cause, "credential check failed");
            AuthError::InvalidCredentials
        })?;

        if !has_module_access(Some(&account), module) {
            tracing::info!(account_id = %account.id, %module, "login denied: no grant for module");
            return Err(AuthError::ModuleAccessDenied);
        }

        let token = self.codec.issue(account.id)?;
        tracing::info!(account_id = %account.id, %module, "credentials verified");

        Ok(Verified {
            account,
            token,
            module,
        })
    }
}

#[async_trait]
impl<S: IdentityStore> TokenValidator for StoreAuthority<S> {
    async fn validate(&self, token: &SessionToken) -> Result<Account, AuthError> {
        let account_id = self.codec.decode(token)?;
        let account = self
            .store
            .find_account_by_id(account_id)
            .ok_or(AuthError::AccountNotFound)?;
        if !self.store.is_active(&account) {
            return Err(AuthError::AccountInactive);
        }
        Ok(account)
    }

    async fn revoke(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.codec.revoke(token).map_err(AuthError::from)
    }
}
