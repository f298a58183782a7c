use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;

pub mod auth;
pub mod system;

/// Router for the credential/token exchange and access checks.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check))
}
