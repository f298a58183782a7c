use campus_auth::{AuthError, SessionSnapshot, SessionToken};

/// Session resolved from the request's bearer token, if any.
///
/// Always present on requests that passed the session middleware. A request
/// without a token carries an unauthenticated snapshot and no rejection.
#[derive(Debug, Clone, Default)]
pub struct RequestSession {
    snapshot: SessionSnapshot,
    token: Option<SessionToken>,
    rejection: Option<AuthError>,
}

impl RequestSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(snapshot: SessionSnapshot, token: SessionToken) -> Self {
        Self {
            snapshot,
            token: Some(token),
            rejection: None,
        }
    }

    /// A token was presented but could not be validated.
    pub fn rejected(token: Option<SessionToken>, error: AuthError) -> Self {
        Self {
            snapshot: SessionSnapshot::failed(error.clone()),
            token,
            rejection: Some(error),
        }
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// The authenticated token, or the reason there is none.
    pub fn require_token(&self) -> Result<&SessionToken, AuthError> {
        if let Some(err) = &self.rejection {
            return Err(err.clone());
        }
        self.token.as_ref().ok_or(AuthError::NotAuthenticated)
    }
}
