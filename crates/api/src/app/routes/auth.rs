use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use campus_auth::{explain, resolve_landing_module, Verified};

use crate::app::dto::{CheckQuery, LoginRequest, LoginResponse, SessionResponse};
use crate::app::errors::auth_error_to_response;
use crate::app::AppState;
use crate::context::RequestSession;

/// `POST /auth/login`: exchange credentials for a token.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    match state
        .verifier
        .verify(&body.username, &body.password, &body.module)
        .await
    {
        Ok(Verified {
            account,
            token,
            module,
        }) => Json(LoginResponse {
            token,
            account,
            active_module: module,
        })
        .into_response(),
        Err(err) => auth_error_to_response(err),
    }
}

/// `GET /auth/session`: validate the bearer token and return the live account.
pub async fn session(State(state): State<AppState>, Extension(session): Extension<RequestSession>) -> Response {
    if let Err(err) = session.require_token() {
        return auth_error_to_response(err);
    }
    let snapshot = session.snapshot();
    let Some(account) = snapshot.account() else {
        return auth_error_to_response(campus_auth::AuthError::NotAuthenticated);
    };

    Json(SessionResponse {
        account: account.clone(),
        active_module: snapshot.active_module,
        landing_module: resolve_landing_module(snapshot, &state.landing),
    })
    .into_response()
}

/// `POST /auth/logout`: revoke the bearer token.
///
/// Works for tokens whose account has since been deactivated or removed, and
/// for tokens that are already expired or revoked.
pub async fn logout(State(state): State<AppState>, Extension(session): Extension<RequestSession>) -> Response {
    let Some(token) = session.token() else {
        return auth_error_to_response(
            session
                .require_token()
                .err()
                .unwrap_or(campus_auth::AuthError::NotAuthenticated),
        );
    };

    match state.validator.revoke(token).await {
        Ok(()) => {
            tracing::info!(account_id = ?session.snapshot().account().map(|a| a.id), "token revoked");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => auth_error_to_response(err),
    }
}

/// `GET /auth/check`: explain the Access Guard decision for the caller.
///
/// Denials are answers, not HTTP errors.
pub async fn check(Extension(session): Extension<RequestSession>, Query(query): Query<CheckQuery>) -> Response {
    let request = match query.into_request() {
        Ok(request) => request,
        Err(response) => return response,
    };
    Json(explain(session.snapshot(), &request)).into_response()
}
