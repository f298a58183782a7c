//! Opaque session tokens and the codec that issues/decodes them.
//!
//! Only the codec looks inside a token. The session state machine stores and
//! forwards it as an opaque string.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use campus_core::{AccountId, TokenId};

use crate::AuthError;

/// Opaque bearer token bound to one account.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Why a token could not be decoded to an account id.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("token is structurally unrecognizable")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token has been revoked")]
    Revoked,
}

impl From<TokenRejection> for AuthError {
    fn from(value: TokenRejection) -> Self {
        match value {
            TokenRejection::Malformed => AuthError::MalformedToken,
            TokenRejection::Expired | TokenRejection::Revoked => AuthError::ExpiredOrRevoked,
        }
    }
}

/// Token issuance/verification boundary.
///
/// Tokens carry no permission snapshot: permissions are re-read from the
/// Identity Store every time a token is validated.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, account_id: AccountId) -> Result<SessionToken, AuthError>;

    fn decode(&self, token: &SessionToken) -> Result<AccountId, TokenRejection>;

    /// Invalidate a token before its natural expiry.
    fn revoke(&self, token: &SessionToken) -> Result<(), TokenRejection>;
}

/// Claims carried by an HS256 session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: AccountId,
    pub jti: TokenId,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub const DEFAULT_ISSUER: &str = "campus-api";

/// HS256 JWT codec with an in-process revocation list.
///
/// Revoked ids are kept only until their token's `exp`; after that the
/// signature check rejects the token on its own.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
    revoked: RwLock<HashMap<TokenId, i64>>,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: DEFAULT_ISSUER.to_string(),
            ttl: Duration::hours(8),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation
    }

    fn claims(&self, token: &SessionToken) -> Result<SessionClaims, TokenRejection> {
        decode::<SessionClaims>(token.as_str(), &self.decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Malformed,
            })
    }

    fn is_revoked(&self, jti: &TokenId) -> bool {
        self.revoked
            .read()
            .map(|revoked| revoked.contains_key(jti))
            .unwrap_or(true)
    }

    /// Record `claims` as revoked and forget every entry expired by `now`.
    fn remember_revoked(&self, claims: &SessionClaims, now: i64) {
        if let Ok(mut revoked) = self.revoked.write() {
            revoked.retain(|_, exp| *exp > now);
            if claims.exp > now {
                revoked.insert(claims.jti, claims.exp);
            }
        }
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, account_id: AccountId) -> Result<SessionToken, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account_id,
            jti: TokenId::new(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(SessionToken::new)
            .map_err(|e| AuthError::unavailable(format!("token issuance failed: {e}")))
    }

    fn decode(&self, token: &SessionToken) -> Result<AccountId, TokenRejection> {
        let claims = self.claims(token)?;
        if self.is_revoked(&claims.jti) {
            return Err(TokenRejection::Revoked);
        }
        Ok(claims.sub)
    }

    fn revoke(&self, token: &SessionToken) -> Result<(), TokenRejection> {
        let claims = match self.claims(token) {
            Ok(claims) => claims,
            // Already unusable.
            Err(TokenRejection::Expired) => return Ok(()),
            Err(other) => return Err(other),
        };
        self.remember_revoked(&claims, Utc::now().timestamp());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_to_account() {
        let codec = Hs256TokenCodec::new("test-secret");
        let id = AccountId::new();
        let token = codec.issue(id).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), id);
    }

    #[test]
    fn garbage_and_foreign_tokens_are_malformed() {
        let codec = Hs256TokenCodec::new("test-secret");
        assert_eq!(
            codec.decode(&SessionToken::new("mock-token.42.1700000000")),
            Err(TokenRejection::Malformed)
        );

        let foreign = Hs256TokenCodec::new("other-secret").issue(AccountId::new()).unwrap();
        assert_eq!(codec.decode(&foreign), Err(TokenRejection::Malformed));

        let other_issuer = Hs256TokenCodec::new("test-secret")
            .with_issuer("someone-else")
            .issue(AccountId::new())
            .unwrap();
        assert_eq!(codec.decode(&other_issuer), Err(TokenRejection::Malformed));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = Hs256TokenCodec::new("test-secret").with_ttl(Duration::seconds(-60));
        let token = codec.issue(AccountId::new()).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenRejection::Expired));
        assert!(codec.revoke(&token).is_ok());
        assert!(codec.revoked.read().unwrap().is_empty());
    }

    #[test]
    fn revoked_token_is_rejected_but_siblings_are_not() {
        let codec = Hs256TokenCodec::new("test-secret");
        let id = AccountId::new();
        let first = codec.issue(id).unwrap();
        let second = codec.issue(id).unwrap();

        codec.revoke(&first).unwrap();
        assert_eq!(codec.decode(&first), Err(TokenRejection::Revoked));
        assert_eq!(codec.decode(&second).unwrap(), id);
        assert_eq!(AuthError::from(TokenRejection::Revoked), AuthError::ExpiredOrRevoked);
    }

    #[test]
    fn revocations_are_forgotten_once_their_tokens_expire() {
        let codec = Hs256TokenCodec::new("test-secret").with_ttl(Duration::minutes(5));
        let token = codec.issue(AccountId::new()).unwrap();
        codec.revoke(&token).unwrap();
        assert_eq!(codec.revoked.read().unwrap().len(), 1);

        let claims = codec.claims(&token).unwrap();
        let later = SessionClaims {
            jti: TokenId::new(),
            exp: claims.exp + 3600,
            ..claims.clone()
        };
        codec.remember_revoked(&later, claims.exp);
        let revoked = codec.revoked.read().unwrap();
        assert!(!revoked.contains_key(&claims.jti));
        assert!(revoked.contains_key(&later.jti));
        drop(revoked);

        // Revoking after everything has expired leaves nothing behind.
        codec.remember_revoked(&later, later.exp);
        assert!(codec.revoked.read().unwrap().is_empty());
    }

    #[test]
    fn debug_output_never_contains_the_token() {
        let token = SessionToken::new("eyJhbGciOiJIUzI1NiJ9.secret.sig");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
