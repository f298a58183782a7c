//! Access explanation (audit trail).
//!
//! Answers "why was this screen/action allowed or denied?" with the same
//! decision [`check`] produces, plus the subject's grants and a readable
//! reason.

use serde::Serialize;

use campus_core::AccountId;

use crate::guard::{check, AccessDecision, AccessRequest};
use crate::{Module, SessionSnapshot, SessionStatus};

/// Detailed explanation of an access decision.
#[derive(Debug, Clone, Serialize)]
pub struct AccessExplanation {
    pub request: AccessRequest,
    pub decision: AccessDecision,
    pub reason: String,
    pub subject: SubjectState,
    pub suggestions: Vec<String>,
}

/// State of the session being checked.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectState {
    pub status: SessionStatus,
    pub account_id: Option<AccountId>,
    pub username: Option<String>,
    pub active_module: Option<Module>,
    pub grants: Vec<GrantSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantSummary {
    pub module: Module,
    pub capabilities: Vec<String>,
    pub managed: bool,
}

/// Explain why `check(session, request)` decides what it decides.
pub fn explain(session: &SessionSnapshot, request: &AccessRequest) -> AccessExplanation {
    let decision = check(session, request);
    let subject = subject_state(session);

    let (reason, suggestions) = match &decision {
        AccessDecision::RedirectToLogin { .. } => (
            format!("Session is {}; authentication is required", session.status),
            vec!["Log in and retry; the original path is kept for the redirect".to_string()],
        ),
        AccessDecision::AwaitSession => (
            "Session is authenticated but the account is not attached yet".to_string(),
            vec!["Render a loading state and re-check once the account is available".to_string()],
        ),
        AccessDecision::Proceed => (proceed_reason(session, request), Vec::new()),
        AccessDecision::DenyModule { module } => (
            format!(
                "Account holds no grant for module '{module}'. Granted modules: {:?}",
                subject.grants.iter().map(|g| g.module.as_str()).collect::<Vec<_>>()
            ),
            vec![
                format!("Grant the account access to the '{module}' module"),
                "Switch to a module the account can enter".to_string(),
            ],
        ),
        AccessDecision::DenyPermission { module, capability } => (
            format!("Grant for module '{module}' holds neither '{capability}' nor 'manage'"),
            vec![
                format!("Add '{capability}' to the account's '{module}' grant"),
                format!("Add 'manage' to the account's '{module}' grant"),
            ],
        ),
    };

    AccessExplanation {
        request: request.clone(),
        decision,
        reason,
        subject,
        suggestions,
    }
}

fn proceed_reason(session: &SessionSnapshot, request: &AccessRequest) -> String {
    let Some(module) = request.module else {
        return "Resource is not scoped to a module; an authenticated session suffices".to_string();
    };
    if request.capability.is_read() {
        return format!("Account has access to module '{module}' (read is implied)");
    }
    let managed = session
        .account()
        .and_then(|a| a.permissions.get(module))
        .is_some_and(|g| g.is_managed());
    if managed {
        format!("Account holds 'manage' in module '{module}'")
    } else {
        format!(
            "Account holds '{}' in module '{module}'",
            request.capability
        )
    }
}

fn subject_state(session: &SessionSnapshot) -> SubjectState {
    let account = session.account();
    SubjectState {
        status: session.status,
        account_id: account.map(|a| a.id),
        username: account.map(|a| a.username.clone()),
        active_module: session.active_module,
        grants: account
            .map(|a| {
                a.permissions
                    .iter()
                    .map(|g| GrantSummary {
                        module: g.module,
                        capabilities: g.capabilities.iter().map(|c| c.as_str().to_string()).collect(),
                        managed: g.is_managed(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}
