use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;

use campus_auth::{
    CredentialVerifier, Hs256TokenCodec, IdentityStore, LandingPolicy, StoreAuthority, TokenValidator,
};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared handler state: the server side of the credential/token exchange.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn CredentialVerifier>,
    pub validator: Arc<dyn TokenValidator>,
    pub landing: LandingPolicy,
}

impl AppState {
    pub fn with_authority<A>(authority: Arc<A>, landing: LandingPolicy) -> Self
    where
        A: CredentialVerifier + TokenValidator + 'static,
    {
        Self {
            verifier: authority.clone(),
            validator: authority,
            landing,
        }
    }

    /// HS256 tokens per `config`, accounts from `identities`.
    pub fn from_config<S>(config: &ApiConfig, identities: S) -> Self
    where
        S: IdentityStore + 'static,
    {
        let codec = Hs256TokenCodec::new(config.jwt_secret.as_bytes())
            .with_issuer(config.token_issuer.clone())
            .with_ttl(config.token_ttl);
        let authority = Arc::new(StoreAuthority::new(identities, Arc::new(codec)));
        Self::with_authority(authority, config.landing)
    }
}

pub fn build_app(state: AppState) -> Router {
    let session_state = middleware::SessionState {
        validator: state.validator.clone(),
    };

    // Every auth route sees a resolved (possibly anonymous) session.
    let auth = routes::router()
        .layer(axum::middleware::from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(auth)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_log)))
}
