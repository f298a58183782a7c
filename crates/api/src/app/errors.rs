use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use campus_auth::AuthError;

pub fn auth_error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::ModuleNotSelected => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::MalformedToken
        | AuthError::ExpiredOrRevoked
        | AuthError::AccountInactive
        | AuthError::AccountNotFound
        | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        AuthError::ModuleAccessDenied => StatusCode::FORBIDDEN,
        AuthError::InProgress | AuthError::Cancelled | AuthError::AlreadyAuthenticated => {
            StatusCode::CONFLICT
        }
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Error body `{error: <code>, message}`; the code round-trips through
/// [`AuthError::from_code`] on the client.
pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    json_error(auth_error_status(&err), err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(auth_error_status(&AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_error_status(&AuthError::ModuleNotSelected), StatusCode::BAD_REQUEST);
        assert_eq!(auth_error_status(&AuthError::ModuleAccessDenied), StatusCode::FORBIDDEN);
        assert_eq!(
            auth_error_status(&AuthError::unavailable("db down")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
