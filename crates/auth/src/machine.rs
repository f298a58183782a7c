//! Session state machine.
//!
//! ```text
//! Unauthenticated ──resume (pair persisted)──► Verifying ──ok──► Authenticated
//!        │                                        │  └──err──► Unauthenticated (pair cleared)
//!        └──────────login────────────────────►    │
//! Error ───────────login────────────────────►     └──err──► Error (nothing persisted)
//! any ─────────────logout───────────────────► Unauthenticated (pair cleared)
//! ```
//!
//! One verification may be in flight at a time. Every transition out of
//! `Verifying` that the verification itself did not cause (logout, cancel,
//! dropping the future) bumps a generation counter; a result arriving for an
//! older generation is discarded as `Cancelled`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::explain::{explain, AccessExplanation};
use crate::guard::{check, AccessDecision, AccessRequest};
use crate::landing::{account_landing_module, resolve_landing_module, LandingPolicy};
use crate::permissions;
use crate::{
    Account, AuthError, Capability, CredentialVerifier, Module, PersistedSession, SessionSnapshot,
    SessionStatus, SessionStore, SessionToken, TokenValidator, Verified,
};

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    status: SessionStatus,
    account: Option<Arc<Account>>,
    token: Option<SessionToken>,
    active_module: Option<Module>,
    error: Option<AuthError>,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            account: self.account.clone(),
            active_module: self.active_module,
            error: self.error.clone(),
        }
    }

    fn clear(&mut self) {
        self.account = None;
        self.token = None;
        self.active_module = None;
        self.error = None;
    }

    /// Enter `Verifying` under a fresh generation.
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.clear();
        self.status = SessionStatus::Verifying;
        self.generation
    }

    fn authenticate(&mut self, account: Account, token: SessionToken, module: Module) {
        self.status = SessionStatus::Authenticated;
        self.account = Some(Arc::new(account));
        self.token = Some(token);
        self.active_module = Some(module);
        self.error = None;
    }

    fn fail(&mut self, error: AuthError) {
        self.clear();
        self.status = SessionStatus::Error;
        self.error = Some(error);
    }

    fn reset(&mut self) {
        self.clear();
        self.status = SessionStatus::Unauthenticated;
    }
}

/// Tracks one in-flight verification; abandoning it (dropping the future)
/// behaves like [`SessionMachine::cancel`].
struct InFlight<'a> {
    machine: &'a SessionMachine,
    generation: u64,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(machine: &'a SessionMachine, generation: u64) -> Self {
        Self {
            machine,
            generation,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.machine.lock();
        if state.generation == self.generation && state.status == SessionStatus::Verifying {
            state.generation += 1;
            state.reset();
            tracing::debug!(generation = self.generation, "verification abandoned before completion");
        }
    }
}

/// Single-instance session owner for one client process.
///
/// All methods take `&self`; the state sits behind a mutex that is never
/// held across an await, so the machine can be shared (e.g. in an `Arc`)
/// between the UI and background tasks.
pub struct SessionMachine {
    verifier: Arc<dyn CredentialVerifier>,
    validator: Arc<dyn TokenValidator>,
    store: Arc<dyn SessionStore>,
    landing: LandingPolicy,
    state: Mutex<SessionState>,
}

impl SessionMachine {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        validator: Arc<dyn TokenValidator>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            verifier,
            validator,
            store,
            landing: LandingPolicy::default(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Use one backend for both credential verification and token validation.
    pub fn from_authority<A>(authority: Arc<A>, store: Arc<dyn SessionStore>) -> Self
    where
        A: CredentialVerifier + TokenValidator + 'static,
    {
        Self::new(authority.clone(), authority, store)
    }

    pub fn with_landing_policy(mut self, landing: LandingPolicy) -> Self {
        self.landing = landing;
        self
    }

    pub fn landing_policy(&self) -> &LandingPolicy {
        &self.landing
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Authenticate with credentials for `module`.
    ///
    /// Legal from `Unauthenticated` or `Error`. On success the token and
    /// module are persisted together; on failure nothing is persisted and the
    /// session moves to `Error`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        module: &str,
    ) -> Result<SessionSnapshot, AuthError> {
        let generation = {
            let mut state = self.lock();
            match state.status {
                SessionStatus::Verifying => return Err(AuthError::InProgress),
                SessionStatus::Authenticated => return Err(AuthError::AlreadyAuthenticated),
                SessionStatus::Unauthenticated | SessionStatus::Error => state.begin(),
            }
        };

        let mut in_flight = InFlight::new(self, generation);
        let outcome = self.verifier.verify(username, password, module).await;

        let orphaned = {
            let mut state = self.lock();
            in_flight.settle();
            if state.generation == generation {
                return self.apply_login(&mut state, outcome);
            }
            outcome.ok().map(|verified| verified.token)
        };

        tracing::debug!(generation, "discarding stale login result");
        if let Some(token) = orphaned {
            if let Err(err) = self.validator.revoke(&token).await {
                tracing::warn!(error = %err, "failed to revoke token from abandoned login");
            }
        }
        Err(AuthError::Cancelled)
    }

    fn apply_login(
        &self,
        state: &mut SessionState,
        outcome: Result<Verified, AuthError>,
    ) -> Result<SessionSnapshot, AuthError> {
        match outcome {
            Ok(Verified {
                account,
                token,
                module,
            }) => {
                self.store.save(&PersistedSession::new(token.clone(), module));
                tracing::info!(account_id = %account.id, %module, "session authenticated");
                state.authenticate(account, token, module);
                Ok(state.snapshot())
            }
            Err(err) => {
                tracing::info!(error = %err, "login failed");
                state.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Restore a persisted session (e.g. on page load / process start).
    ///
    /// With nothing (or only half a pair) persisted the session ends
    /// `Unauthenticated`, dropping any earlier `Error`. A rejected token clears
    /// the pair and ends `Unauthenticated`; an unavailable validator ends in
    /// `Error` and keeps the pair.
    pub async fn resume(&self) -> Result<SessionSnapshot, AuthError> {
        let (generation, persisted) = {
            let mut state = self.lock();
            match state.status {
                SessionStatus::Verifying => return Err(AuthError::InProgress),
                SessionStatus::Authenticated => return Ok(state.snapshot()),
                SessionStatus::Unauthenticated | SessionStatus::Error => {}
            }
            let Some(persisted) = self.store.load() else {
                self.store.clear();
                state.reset();
                return Ok(state.snapshot());
            };
            (state.begin(), persisted)
        };

        let mut in_flight = InFlight::new(self, generation);
        let outcome = self.validator.validate(&persisted.token).await;

        let mut state = self.lock();
        in_flight.settle();
        if state.generation != generation {
            tracing::debug!(generation, "discarding stale resume result");
            return Err(AuthError::Cancelled);
        }

        match outcome {
            Ok(account) => {
                let module = if permissions::has_module_access(Some(&account), persisted.active_module) {
                    persisted.active_module
                } else {
                    let module = account_landing_module(Some(&account), &self.landing);
                    tracing::info!(
                        account_id = %account.id,
                        from = %persisted.active_module,
                        to = %module,
                        "restored module no longer granted"
                    );
                    self.store
                        .save(&PersistedSession::new(persisted.token.clone(), module));
                    module
                };
                tracing::info!(account_id = %account.id, %module, "session resumed");
                state.authenticate(account, persisted.token, module);
                Ok(state.snapshot())
            }
            Err(err) if err.invalidates_token() => {
                tracing::info!(error = %err, "stored session rejected");
                self.store.clear();
                state.reset();
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not validate stored session");
                state.fail(err.clone());
                Err(err)
            }
        }
    }

    /// End the session.
    ///
    /// The local transition happens before the first await and always
    /// completes; server-side revocation afterwards is best effort.
    pub async fn logout(&self) {
        let token = {
            let mut state = self.lock();
            state.generation += 1;
            let token = state.token.take();
            let account_id = state.account.as_ref().map(|a| a.id);
            state.reset();
            self.store.clear();
            tracing::info!(account_id = ?account_id, "logged out");
            token
        };

        if let Some(token) = token {
            if let Err(err) = self.validator.revoke(&token).await {
                tracing::warn!(error = %err, "server-side token revocation failed");
            }
        }
    }

    /// Abandon an in-flight verification. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.status != SessionStatus::Verifying {
            return false;
        }
        state.generation += 1;
        state.reset();
        tracing::debug!(generation = state.generation, "verification cancelled");
        true
    }

    /// Move the authenticated session to another granted module.
    ///
    /// Does not re-validate the token.
    pub fn switch_module(&self, module: Module) -> Result<SessionSnapshot, AuthError> {
        let mut state = self.lock();
        if state.status != SessionStatus::Authenticated {
            return Err(AuthError::NotAuthenticated);
        }
        let (Some(account), Some(token)) = (state.account.clone(), state.token.clone()) else {
            return Err(AuthError::NotAuthenticated);
        };
        if !permissions::has_module_access(Some(&account), module) {
            return Err(AuthError::ModuleAccessDenied);
        }

        self.store.save(&PersistedSession::new(token, module));
        state.active_module = Some(module);
        tracing::info!(account_id = %account.id, %module, "switched module");
        Ok(state.snapshot())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries (pure over the current snapshot)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn session(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Staleness counter; increases on every verification start and abort.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn has_module_access(&self, module: Module) -> bool {
        permissions::has_module_access(self.session().account(), module)
    }

    pub fn has_capability(&self, module: Module, capability: &Capability) -> bool {
        permissions::has_capability(self.session().account(), module, capability)
    }

    pub fn check(&self, request: &AccessRequest) -> AccessDecision {
        check(&self.session(), request)
    }

    pub fn explain(&self, request: &AccessRequest) -> AccessExplanation {
        explain(&self.session(), request)
    }

    pub fn resolve_landing_module(&self) -> Module {
        resolve_landing_module(&self.session(), &self.landing)
    }
}

impl core::fmt::Debug for SessionMachine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionMachine")
            .field("status", &state.status)
            .field("generation", &state.generation)
            .field("active_module", &state.active_module)
            .finish_non_exhaustive()
    }
}
