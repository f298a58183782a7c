//! HTTP client side of the credential/token exchange.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use campus_auth::{
    Account, AuthError, CredentialVerifier, Module, SessionToken, TokenValidator, Verified,
};

/// Talks to `campus-api`; every server error body is mapped back onto the
/// same [`AuthError`] variant the server produced.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    token: SessionToken,
    account: Account,
    active_module: Module,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    account: Account,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        self.client
            .get(self.url("/health"))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(e: reqwest::Error) -> AuthError {
    AuthError::unavailable(format!("network error: {e}"))
}

async fn error_from_response(resp: reqwest::Response) -> AuthError {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => AuthError::from_code(&body.error, body.message).unwrap_or_else(|| {
            AuthError::unavailable(format!("unexpected error code '{}' ({status})", body.error))
        }),
        Err(_) => AuthError::unavailable(format!("unexpected response status {status}")),
    }
}

#[async_trait]
impl CredentialVerifier for HttpAuthBackend {
    async fn verify(
        &self,
        username: &str,
        password: &str,
        requested_module: &str,
    ) -> Result<Verified, AuthError> {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({
                "username": username,
                "password": password,
                "module": requested_module,
            }))
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let body: LoginBody = resp
            .json()
            .await
            .map_err(|e| AuthError::unavailable(format!("invalid login response: {e}")))?;
        Ok(Verified {
            account: body.account,
            token: body.token,
            module: body.active_module,
        })
    }
}

#[async_trait]
impl TokenValidator for HttpAuthBackend {
    async fn validate(&self, token: &SessionToken) -> Result<Account, AuthError> {
        let resp = self
            .client
            .get(self.url("/auth/session"))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let body: SessionBody = resp
            .json()
            .await
            .map_err(|e| AuthError::unavailable(format!("invalid session response: {e}")))?;
        Ok(body.account)
    }

    async fn revoke(&self, token: &SessionToken) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.url("/auth/logout"))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(transport)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(resp).await)
        }
    }
}
