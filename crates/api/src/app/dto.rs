use serde::{Deserialize, Serialize};

use campus_auth::{Account, AccessRequest, Capability, Module, SessionToken};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Raw module string; validated by the verifier so a missing or unknown
    /// module surfaces as `module_not_selected`.
    #[serde(default)]
    pub module: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub module: Option<String>,
    pub capability: Option<String>,
    pub path: Option<String>,
}

impl CheckQuery {
    pub fn into_request(self) -> Result<AccessRequest, axum::response::Response> {
        let mut request = AccessRequest::new(self.path.unwrap_or_else(|| "/".to_string()));

        if let Some(module) = self.module.filter(|m| !m.trim().is_empty()) {
            let module: Module = module.parse().map_err(|e: campus_core::DomainError| {
                errors::json_error(axum::http::StatusCode::BAD_REQUEST, "invalid_module", e.to_string())
            })?;
            request = request.in_module(module);
        }

        if let Some(capability) = self.capability.filter(|c| !c.trim().is_empty()) {
            request = request.with_capability(Capability::new(capability.trim().to_ascii_lowercase()));
        }

        Ok(request)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: SessionToken,
    pub account: Account,
    pub active_module: Module,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub account: Account,
    pub active_module: Option<Module>,
    pub landing_module: Module,
}
