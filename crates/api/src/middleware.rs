use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};

use campus_auth::{AuthError, Module, SessionSnapshot, SessionToken, TokenValidator};

use crate::context::RequestSession;

/// Client hint for the session-scoped module (landing step 1).
pub const ACTIVE_MODULE_HEADER: HeaderName = HeaderName::from_static("x-active-module");

#[derive(Clone)]
pub struct SessionState {
    pub validator: Arc<dyn TokenValidator>,
}

/// Resolve the optional bearer token into a [`RequestSession`] extension.
///
/// Never rejects by itself: handlers decide whether they need a session.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let bearer = extract_bearer(req.headers()).map(|t| t.map(SessionToken::new));
    let session = match bearer {
        Ok(None) => RequestSession::anonymous(),
        Ok(Some(token)) => {
            match state.validator.validate(&token).await {
                Ok(account) => {
                    let active_module = active_module_hint(req.headers());
                    let snapshot = SessionSnapshot::authenticated(Arc::new(account), active_module);
                    RequestSession::authenticated(snapshot, token)
                }
                Err(err) => {
                    tracing::debug!(error = %err, "bearer token rejected");
                    RequestSession::rejected(Some(token), err)
                }
            }
        }
        Err(err) => RequestSession::rejected(None, err),
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

/// One line per request; headers are never logged.
pub async fn request_log(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// `Ok(None)` when no Authorization header is present at all.
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| AuthError::MalformedToken)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }

    Ok(Some(token))
}

fn active_module_hint(headers: &HeaderMap) -> Option<Module> {
    headers
        .get(&ACTIVE_MODULE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers(&[])), Ok(None));
        assert_eq!(
            extract_bearer(&headers(&[("authorization", "Bearer abc.def")])),
            Ok(Some("abc.def"))
        );
        assert_eq!(
            extract_bearer(&headers(&[("authorization", "Basic dXNlcjpwdw==")])),
            Err(AuthError::MalformedToken)
        );
        assert_eq!(
            extract_bearer(&headers(&[("authorization", "Bearer   ")])),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn module_hint_is_lenient() {
        assert_eq!(active_module_hint(&headers(&[("x-active-module", "Hostel")])), Some(Module::Hostel));
        assert_eq!(active_module_hint(&headers(&[("x-active-module", "canteen")])), None);
        assert_eq!(active_module_hint(&headers(&[])), None);
    }
}
