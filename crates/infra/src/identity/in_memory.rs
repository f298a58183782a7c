use std::collections::HashMap;
use std::sync::RwLock;

use campus_auth::{Account, IdentityStore, Module, ModuleGrants};
use campus_core::AccountId;

use super::{CredentialHasher, IdentityStoreError};

#[derive(Debug, Clone)]
struct AccountRecord {
    account: Account,
    password_hash: String,
}

/// In-memory Identity Store for tests/dev.
///
/// Sole writer of account records; every write is visible to the next token
/// validation.
/// Verified against when no record matches, so a miss costs one hash check.
const UNMATCHED_PASSWORD: &str = "campus-unmatched-credential";

#[derive(Debug)]
pub struct InMemoryIdentityStore {
    inner: RwLock<HashMap<AccountId, AccountRecord>>,
    hasher: CredentialHasher,
    unmatched_hash: Option<String>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::with_hasher(CredentialHasher::new())
    }

    pub fn with_hasher(hasher: CredentialHasher) -> Self {
        let unmatched_hash = hasher
            .hash(UNMATCHED_PASSWORD)
            .inspect_err(|e| tracing::warn!(error = %e, "could not prepare the unmatched-credential hash"))
            .ok();
        Self {
            inner: RwLock::new(HashMap::new()),
            hasher,
            unmatched_hash,
        }
    }

    /// Add an account with a plaintext password, hashed on the way in.
    pub fn insert(&self, account: Account, password: &str) -> Result<AccountId, IdentityStoreError> {
        let password_hash = self.hasher.hash(password)?;
        let mut map = self.inner.write().map_err(|_| IdentityStoreError::Poisoned)?;

        if map.values().any(|r| r.account.username == account.username) {
            return Err(IdentityStoreError::DuplicateUsername(account.username));
        }

        let id = account.id;
        tracing::debug!(account_id = %id, username = %account.username, "account added");
        map.insert(
            id,
            AccountRecord {
                account,
                password_hash,
            },
        );
        Ok(id)
    }

    pub fn remove(&self, id: AccountId) -> Result<Account, IdentityStoreError> {
        let mut map = self.inner.write().map_err(|_| IdentityStoreError::Poisoned)?;
        map.remove(&id)
            .map(|r| r.account)
            .ok_or(IdentityStoreError::NotFound(id))
    }

    pub fn set_active(&self, id: AccountId, active: bool) -> Result<(), IdentityStoreError> {
        self.update(id, |account| account.active = active)
    }

    pub fn set_permissions(&self, id: AccountId, permissions: ModuleGrants) -> Result<(), IdentityStoreError> {
        self.update(id, |account| account.permissions = permissions)
    }

    pub fn set_default_module(&self, id: AccountId, module: Option<Module>) -> Result<(), IdentityStoreError> {
        self.update(id, |account| account.default_module = module)
    }

    pub fn set_password(&self, id: AccountId, password: &str) -> Result<(), IdentityStoreError> {
        let password_hash = self.hasher.hash(password)?;
        let mut map = self.inner.write().map_err(|_| IdentityStoreError::Poisoned)?;
        let record = map.get_mut(&id).ok_or(IdentityStoreError::NotFound(id))?;
        record.password_hash = password_hash;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stored_hash(&self, account: Option<&Account>) -> Option<String> {
        let account = account?;
        let map = self.inner.read().ok()?;
        map.get(&account.id).map(|r| r.password_hash.clone())
    }

    /// Spend one hash check on a password that has no record.
    fn burn_unmatched(&self, password: &str) {
        match &self.unmatched_hash {
            Some(phc) => {
                self.hasher.verify(phc, password);
            }
            None => {
                let _ = self.hasher.hash(password);
            }
        }
    }

    fn update(&self, id: AccountId, f: impl FnOnce(&mut Account)) -> Result<(), IdentityStoreError> {
        let mut map = self.inner.write().map_err(|_| IdentityStoreError::Poisoned)?;
        let record = map.get_mut(&id).ok_or(IdentityStoreError::NotFound(id))?;
        f(&mut record.account);
        tracing::debug!(account_id = %id, "account updated");
        Ok(())
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn find_account_by_username(&self, username: &str) -> Option<Account> {
        let map = self.inner.read().ok()?;
        map.values()
            .find(|r| r.account.username == username)
            .map(|r| r.account.clone())
    }

    fn find_account_by_id(&self, id: AccountId) -> Option<Account> {
        let map = self.inner.read().ok()?;
        map.get(&id).map(|r| r.account.clone())
    }

    fn verify_password(&self, account: Option<&Account>, password: &str) -> bool {
        match self.stored_hash(account) {
            Some(hash) => self.hasher.verify(&hash, password),
            None => {
                self.burn_unmatched(password);
                false
            }
        }
    }
}
