use std::sync::Arc;

use campus_api::app::{build_app, AppState};
use campus_api::config::ApiConfig;
use campus_infra::{demo_identity_store, CredentialHasher};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, demo accounts with cheap hashes, ephemeral port.
        let config = ApiConfig::from_lookup(|name| match name {
            "CAMPUS_JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })
        .unwrap();
        let identities = Arc::new(demo_identity_store(CredentialHasher::light()).unwrap());
        let app = build_app(AppState::from_config(&config, identities));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, client: &reqwest::Client, username: &str, password: &str, module: &str) -> reqwest::Response {
        client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password, "module": module }))
            .send()
            .await
            .unwrap()
    }

    async fn token_for(&self, client: &reqwest::Client, username: &str, password: &str, module: &str) -> String {
        let res = self.login(client, username, password, module).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_expired_jwt(account_id: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": account_id,
        "jti": uuid::Uuid::now_v7().to_string(),
        "iss": "campus-api",
        "iat": (now - ChronoDuration::hours(9)).timestamp(),
        "exp": (now - ChronoDuration::hours(1)).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_then_session_lookup() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = srv.login(&client, "warden", "warden123", "boarding").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["active_module"], "boarding");
    assert_eq!(body["account"]["username"], "warden");
    assert!(body["account"].get("password").is_none());
    let token = body["token"].as_str().unwrap();

    // Landing step 1: the client's session-scoped module.
    let res = client
        .get(srv.url("/auth/session"))
        .bearer_auth(token)
        .header("x-active-module", "boarding")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["landing_module"], "boarding");

    // Without it, the account default (hostel) wins.
    let res = client
        .get(srv.url("/auth/session"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["landing_module"], "hostel");
    assert!(body["active_module"].is_null());
}

#[tokio::test]
async fn invalid_credentials_look_the_same() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let wrong_password = srv.login(&client, "admin", "wrong-password", "education").await;
    let unknown_user = srv.login(&client, "nobody", "admin123", "education").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a["error"], "invalid_credentials");
}

#[tokio::test]
async fn module_errors_on_login() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = srv.login(&client, "teacher", "teacher123", "").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "module_not_selected");

    let res = srv.login(&client, "teacher", "teacher123", "hostel").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "module_access_denied");
}

#[tokio::test]
async fn session_requires_a_valid_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/auth/session")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "not_authenticated");

    let res = client
        .get(srv.url("/auth/session"))
        .bearer_auth("mock-token.42.1700000000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "malformed_token");

    let token = srv.token_for(&client, "admin", "admin123", "accounts").await;
    let me: Value = client
        .get(srv.url("/auth/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let expired = mint_expired_jwt(me["account"]["id"].as_str().unwrap());
    let res = client
        .get(srv.url("/auth/session"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "expired_or_revoked");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = srv.token_for(&client, "librarian", "library123", "library").await;

    let res = client
        .post(srv.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url("/auth/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "expired_or_revoked");

    let res = client.post(srv.url("/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn check_explains_every_decision() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/auth/check?module=education&path=/education/classes"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["decision"]["decision"], "redirect_to_login");
    assert_eq!(body["decision"]["return_path"], "/education/classes");

    let token = srv.token_for(&client, "teacher", "teacher123", "education").await;
    let decide = |query: &'static str| {
        let client = client.clone();
        let url = srv.url(&format!("/auth/check?{query}"));
        let token = token.clone();
        async move {
            let res = client.get(url).bearer_auth(token).send().await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let body: Value = res.json().await.unwrap();
            body["decision"]["decision"].as_str().unwrap().to_string()
        }
    };

    assert_eq!(decide("module=education&capability=write").await, "proceed");
    assert_eq!(decide("module=education&capability=delete").await, "deny_permission");
    assert_eq!(decide("module=hostel").await, "deny_module");
    assert_eq!(decide("path=/profile").await, "proceed");

    let res = client
        .get(srv.url("/auth/check?module=canteen"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "invalid_module");
}
