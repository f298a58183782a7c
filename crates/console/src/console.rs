//! Client runtime: one [`SessionMachine`] per process invocation.

use std::sync::Arc;

use serde::Serialize;

use campus_auth::{
    accessible_modules, AccessExplanation, AccessRequest, AuthError, CredentialVerifier,
    LandingPolicy, Module, SessionMachine, SessionSnapshot, SessionStatus, SessionStore,
    TokenValidator,
};
use campus_core::AccountId;

use crate::backend::HttpAuthBackend;

/// What `status` (and every state-changing command) prints.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: SessionStatus,
    pub account: Option<AccountSummary>,
    pub active_module: Option<Module>,
    pub landing_module: Module,
    pub accessible_modules: Vec<Module>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub username: String,
    pub display_name: String,
}

pub struct Console {
    machine: SessionMachine,
}

impl Console {
    pub fn new<A>(backend: Arc<A>, store: Arc<dyn SessionStore>, landing: LandingPolicy) -> Self
    where
        A: CredentialVerifier + TokenValidator + 'static,
    {
        let machine = SessionMachine::from_authority(backend, store).with_landing_policy(landing);
        Self { machine }
    }

    /// Console against a running `campus-api`.
    pub fn connect(api_url: &str, store: Arc<dyn SessionStore>, landing: LandingPolicy) -> Self {
        Self::new(Arc::new(HttpAuthBackend::new(api_url)), store, landing)
    }

    /// Restore any persisted session, like a page load would.
    ///
    /// A rejected token is reported and leaves the console logged out; it
    /// never prevents the requested command from running.
    pub async fn start(&self) -> Option<AuthError> {
        match self.machine.resume().await {
            Ok(session) => {
                tracing::debug!(status = %session.status, "session restored");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not restore session");
                Some(err)
            }
        }
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub async fn login(&self, username: &str, password: &str, module: &str) -> Result<StatusReport, AuthError> {
        self.machine.login(username, password, module).await?;
        Ok(self.status())
    }

    pub async fn logout(&self) -> StatusReport {
        self.machine.logout().await;
        self.status()
    }

    pub fn switch(&self, module: Module) -> Result<StatusReport, AuthError> {
        self.machine.switch_module(module)?;
        Ok(self.status())
    }

    pub fn check(&self, request: &AccessRequest) -> AccessExplanation {
        self.machine.explain(request)
    }

    pub fn landing(&self) -> Module {
        self.machine.resolve_landing_module()
    }

    pub fn status(&self) -> StatusReport {
        report(&self.machine.session(), self.landing())
    }
}

fn report(session: &SessionSnapshot, landing_module: Module) -> StatusReport {
    let account = session.account();
    StatusReport {
        status: session.status,
        account: account.map(|a| AccountSummary {
            id: a.id,
            username: a.username.clone(),
            display_name: a.display_name(),
        }),
        active_module: session.active_module,
        landing_module,
        accessible_modules: accessible_modules(account),
        error: session.error.as_ref().map(|e| e.code().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_auth::{Hs256TokenCodec, StoreAuthority};
    use campus_infra::{demo_identity_store, CredentialHasher, InMemorySessionStore, RawSession};

    type Authority = StoreAuthority<campus_infra::InMemoryIdentityStore>;

    fn backend() -> Arc<Authority> {
        let identities = demo_identity_store(CredentialHasher::light()).unwrap();
        Arc::new(StoreAuthority::new(identities, Arc::new(Hs256TokenCodec::new("console-secret"))))
    }

    #[tokio::test]
    async fn fresh_console_reports_the_fallback() {
        let console = Console::new(
            backend(),
            Arc::new(InMemorySessionStore::new()),
            LandingPolicy::new(Module::Boarding),
        );
        assert_eq!(console.start().await, None);

        let report = console.status();
        assert_eq!(report.status, SessionStatus::Unauthenticated);
        assert!(report.account.is_none());
        assert_eq!(report.landing_module, Module::Boarding);
        assert!(report.accessible_modules.is_empty());
    }

    #[tokio::test]
    async fn login_is_restored_by_the_next_invocation() {
        let backend = backend();
        let store = Arc::new(InMemorySessionStore::new());

        let first = Console::new(backend.clone(), store.clone(), LandingPolicy::default());
        let report = first.login("warden", "warden123", "boarding").await.unwrap();
        assert_eq!(report.active_module, Some(Module::Boarding));
        assert_eq!(report.accessible_modules, vec![Module::Hostel, Module::Boarding]);
        assert_eq!(report.account.unwrap().display_name, "Wes Warden");

        let second = Console::new(backend, store, LandingPolicy::default());
        assert_eq!(second.start().await, None);
        assert_eq!(second.landing(), Module::Boarding);
        assert_eq!(second.switch(Module::Hostel).unwrap().active_module, Some(Module::Hostel));
    }

    #[tokio::test]
    async fn rejected_token_is_reported_but_not_fatal() {
        let store = Arc::new(InMemorySessionStore::new());
        store.set_raw(RawSession {
            token: Some("mock-token.42.1700000000".into()),
            active_module: Some("hostel".into()),
        });
        let console = Console::new(backend(), store.clone(), LandingPolicy::default());

        assert_eq!(console.start().await, Some(AuthError::MalformedToken));
        assert_eq!(console.status().status, SessionStatus::Unauthenticated);
        assert_eq!(store.raw(), RawSession::default());

        let report = console.login("teacher", "teacher123", "education").await.unwrap();
        assert_eq!(report.status, SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn failed_login_is_visible_in_status() {
        let console = Console::new(backend(), Arc::new(InMemorySessionStore::new()), LandingPolicy::default());
        let err = console.login("teacher", "nope", "education").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let report = console.status();
        assert_eq!(report.status, SessionStatus::Error);
        assert_eq!(report.error.as_deref(), Some("invalid_credentials"));
    }
}
