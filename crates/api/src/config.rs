//! Process configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use campus_auth::token::DEFAULT_ISSUER;
use campus_auth::{LandingPolicy, Module};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 8 * 60;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: '{value}'")]
    BindAddr { var: &'static str, value: String },

    #[error("{var} must be a positive number of minutes: '{value}'")]
    TokenTtl { var: &'static str, value: String },

    #[error("{var} is not a known module: '{value}'")]
    FallbackModule { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub token_ttl: Duration,
    pub token_issuer: String,
    pub landing: LandingPolicy,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("CAMPUS_JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("CAMPUS_JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let bind_addr = match var("CAMPUS_BIND_ADDR") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::BindAddr {
                var: "CAMPUS_BIND_ADDR",
                value,
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let token_ttl = match var("CAMPUS_TOKEN_TTL_MINUTES") {
            Some(value) => match value.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => Duration::minutes(minutes),
                _ => {
                    return Err(ConfigError::TokenTtl {
                        var: "CAMPUS_TOKEN_TTL_MINUTES",
                        value,
                    });
                }
            },
            None => Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        };

        let landing = match var("CAMPUS_FALLBACK_MODULE") {
            Some(value) => {
                let module: Module = value.parse().map_err(|_| ConfigError::FallbackModule {
                    var: "CAMPUS_FALLBACK_MODULE",
                    value: value.clone(),
                })?;
                LandingPolicy::new(module)
            }
            None => LandingPolicy::default(),
        };

        let token_issuer = var("CAMPUS_TOKEN_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        Ok(Self {
            jwt_secret,
            bind_addr,
            token_ttl,
            token_issuer,
            landing,
        })
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("token_issuer", &self.token_issuer)
            .field("landing", &self.landing)
            .finish()
    }
}
