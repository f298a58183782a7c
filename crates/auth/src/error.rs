use thiserror::Error;

/// Authentication/session error taxonomy.
///
/// Every variant is surfaced once to the caller and never retried by the
/// engine. Access denials are *not* errors; see [`crate::AccessDecision`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username, inactive account or wrong password. The three
    /// causes share this single variant and message.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("no module selected")]
    ModuleNotSelected,

    #[error("account has no access to the requested module")]
    ModuleAccessDenied,

    #[error("malformed session token")]
    MalformedToken,

    #[error("session token expired or revoked")]
    ExpiredOrRevoked,

    #[error("account is inactive")]
    AccountInactive,

    #[error("account not found")]
    AccountNotFound,

    /// Another verification is already in flight for this session.
    #[error("session verification already in progress")]
    InProgress,

    /// The verification was abandoned (logout, cancel) before it completed.
    #[error("session verification cancelled")]
    Cancelled,

    #[error("already authenticated; log out first")]
    AlreadyAuthenticated,

    #[error("not authenticated")]
    NotAuthenticated,

    /// Opaque I/O or transport failure at the verifier/validator boundary.
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Stable wire code (transport-agnostic).
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::ModuleNotSelected => "module_not_selected",
            AuthError::ModuleAccessDenied => "module_access_denied",
            AuthError::MalformedToken => "malformed_token",
            AuthError::ExpiredOrRevoked => "expired_or_revoked",
            AuthError::AccountInactive => "account_inactive",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::InProgress => "in_progress",
            AuthError::Cancelled => "cancelled",
            AuthError::AlreadyAuthenticated => "already_authenticated",
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::Unavailable(_) => "unavailable",
        }
    }

    /// Inverse of [`AuthError::code`]. `message` is only kept for `unavailable`.
    pub fn from_code(code: &str, message: impl Into<String>) -> Option<Self> {
        let err = match code {
            "invalid_credentials" => AuthError::InvalidCredentials,
            "module_not_selected" => AuthError::ModuleNotSelected,
            "module_access_denied" => AuthError::ModuleAccessDenied,
            "malformed_token" => AuthError::MalformedToken,
            "expired_or_revoked" => AuthError::ExpiredOrRevoked,
            "account_inactive" => AuthError::AccountInactive,
            "account_not_found" => AuthError::AccountNotFound,
            "in_progress" => AuthError::InProgress,
            "cancelled" => AuthError::Cancelled,
            "already_authenticated" => AuthError::AlreadyAuthenticated,
            "not_authenticated" => AuthError::NotAuthenticated,
            "unavailable" => AuthError::Unavailable(message.into()),
            _ => return None,
        };
        Some(err)
    }

    /// Token validation failures that must discard the persisted session.
    pub fn invalidates_token(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::ExpiredOrRevoked
                | AuthError::AccountInactive
                | AuthError::AccountNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        let all = [
            AuthError::InvalidCredentials,
            AuthError::ModuleNotSelected,
            AuthError::ModuleAccessDenied,
            AuthError::MalformedToken,
            AuthError::ExpiredOrRevoked,
            AuthError::AccountInactive,
            AuthError::AccountNotFound,
            AuthError::InProgress,
            AuthError::Cancelled,
            AuthError::AlreadyAuthenticated,
            AuthError::NotAuthenticated,
            AuthError::unavailable("connection refused"),
        ];
        for err in all {
            let back = AuthError::from_code(err.code(), "connection refused").unwrap();
            assert_eq!(back, err);
        }
        assert_eq!(AuthError::from_code("teapot", ""), None);
    }
}
