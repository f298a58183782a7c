//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::Semaphore;

use campus_core::AccountId;

use crate::{
    Account, AuthError, Capability, CredentialVerifier, IdentityStore, Module, ModuleGrant,
    ModuleGrants, PersistedSession, SessionStore, SessionToken, TokenValidator, Verified,
};

pub(crate) fn grants(table: &[(Module, &[&'static str])]) -> ModuleGrants {
    ModuleGrants::new(
        table.iter()
            .map(|(module, caps)| ModuleGrant::new(*module, caps.iter().copied().map(Capability::from)))
            .collect(),
    )
    .expect("fixture grants must be unique")
}

pub(crate) fn account_with(table: &[(Module, &[&'static str])]) -> Account {
    Account::new(AccountId::new(), "fixture").with_permissions(grants(table))
}

pub(crate) fn module_strategy() -> impl Strategy<Value = Module> {
    prop::sample::select(Module::ALL.to_vec())
}

pub(crate) fn capability_strategy() -> impl Strategy<Value = Capability> {
    prop::sample::select(vec![
        Capability::READ,
        Capability::WRITE,
        Capability::DELETE,
        Capability::MANAGE,
        Capability::new("export"),
        Capability::new("approve"),
    ])
}

/// Accounts with unique, arbitrarily ordered grants over random capability sets.
pub(crate) fn account_strategy() -> impl Strategy<Value = Account> {
    let modules = prop::sample::subsequence(Module::ALL.to_vec(), 0..=Module::ALL.len()).prop_shuffle();
    (
        modules,
        prop::collection::vec(prop::collection::vec(capability_strategy(), 0..4), Module::ALL.len()),
        prop::option::of(module_strategy()),
    )
        .prop_map(|(modules, caps, default_module)| {
            let grants = modules
                .into_iter()
                .zip(caps)
                .map(|(module, caps)| ModuleGrant::new(module, caps))
                .collect();
            let mut account = Account::new(AccountId::new(), "generated")
                .with_permissions(ModuleGrants::new(grants).expect("subsequence is unique"));
            account.default_module = default_module;
            account
        })
}

/// Identity store double with plaintext passwords. Counts password checks,
/// including the ones made for a missing account.
#[derive(Debug, Default)]
pub(crate) struct FakeIdentityStore {
    inner: RwLock<HashMap<AccountId, (Account, String)>>,
    password_checks: AtomicUsize,
}

impl FakeIdentityStore {
    pub(crate) fn with(accounts: Vec<(Account, &str)>) -> Self {
        let store = Self::default();
        for (account, password) in accounts {
            store.put(account, password);
        }
        store
    }

    pub(crate) fn put(&self, account: Account, password: &str) {
        self.inner
            .write()
            .unwrap()
            .insert(account.id, (account, password.to_string()));
    }

    pub(crate) fn update(&self, id: AccountId, f: impl FnOnce(&mut Account)) {
        if let Some((account, _)) = self.inner.write().unwrap().get_mut(&id) {
            f(account);
        }
    }

    pub(crate) fn remove(&self, id: AccountId) {
        self.inner.write().unwrap().remove(&id);
    }

    pub(crate) fn password_checks(&self) -> usize {
        self.password_checks.load(Ordering::SeqCst)
    }
}

impl IdentityStore for FakeIdentityStore {
    fn find_account_by_username(&self, username: &str) -> Option<Account> {
        self.inner
            .read()
            .unwrap()
            .values()
            .find(|(a, _)| a.username == username)
            .map(|(a, _)| a.clone())
    }

    fn find_account_by_id(&self, id: AccountId) -> Option<Account> {
        self.inner.read().unwrap().get(&id).map(|(a, _)| a.clone())
    }

    fn verify_password(&self, account: Option<&Account>, password: &str) -> bool {
        self.password_checks.fetch_add(1, Ordering::SeqCst);
        let Some(account) = account else {
            return false;
        };
        self.inner
            .read()
            .unwrap()
            .get(&account.id)
            .is_some_and(|(_, stored)| stored == password)
    }
}

/// Session store double holding the two raw halves separately, so tests can
/// corrupt one of them.
#[derive(Debug, Default)]
pub(crate) struct MemorySessionStore {
    raw: Mutex<(Option<String>, Option<String>)>,
}

impl MemorySessionStore {
    pub(crate) fn raw(&self) -> (Option<String>, Option<String>) {
        self.raw.lock().unwrap().clone()
    }

    pub(crate) fn set_raw(&self, token: Option<&str>, module: Option<&str>) {
        *self.raw.lock().unwrap() = (token.map(str::to_string), module.map(str::to_string));
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<PersistedSession> {
        let (token, module) = self.raw();
        PersistedSession::from_parts(token, module)
    }

    fn save(&self, session: &PersistedSession) {
        self.set_raw(Some(session.token.as_str()), Some(session.active_module.as_str()));
    }

    fn clear(&self) {
        self.set_raw(None, None);
    }
}

/// Backend double that holds every verify/validate call until the test
/// releases a permit.
pub(crate) struct Gated<A> {
    pub(crate) inner: A,
    pub(crate) gate: Arc<Semaphore>,
}

impl<A> Gated<A> {
    pub(crate) fn new(inner: A) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub(crate) fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    async fn pass(&self) -> Result<(), AuthError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| AuthError::unavailable("gate closed"))?;
        permit.forget();
        Ok(())
    }
}

#[async_trait]
impl<A: CredentialVerifier> CredentialVerifier for Gated<A> {
    async fn verify(
        &self,
        username: &str,
        password: &str,
        requested_module: &str,
    ) -> Result<Verified, AuthError> {
        self.pass().await?;
        self.inner.verify(username, password, requested_module).await
    }
}

#[async_trait]
impl<A: TokenValidator> TokenValidator for Gated<A> {
    async fn validate(&self, token: &SessionToken) -> Result<Account, AuthError> {
        self.pass().await?;
        self.inner.validate(token).await
    }

    async fn revoke(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.inner.revoke(token).await
    }
}
