//! Bearer-token authentication for guarded table operations
//!
//! Token validation itself is delegated to a [`ClaimsValidator`]; this module
//! only extracts the token from its header form and defines the claims the
//! rest of the crate consumes.

use crate::core::error::{AuthError, ProcessResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Decoded, validated token payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Session id used when executing processes on behalf of the caller
    pub sid: String,

    /// Token subject (usually the user id)
    #[serde(default)]
    pub subject: Option<String>,

    /// Any other claims the validator chose to keep
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl AuthClaims {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            ..Default::default()
        }
    }
}

/// Validates a raw bearer token and returns its claims
///
/// Errors are surfaced to the caller unchanged, so implementations pick the
/// error class.
#[async_trait]
pub trait ClaimsValidator: Send + Sync {
    async fn validate(&self, token: &str) -> ProcessResult<AuthClaims>;
}

/// Strip the `Bearer ` prefix and surrounding whitespace
///
/// Returns `None` when nothing is left.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Fixed token table (for development and tests)
#[derive(Debug, Clone, Default)]
pub struct StaticClaimsValidator {
    tokens: HashMap<String, AuthClaims>,
}

impl StaticClaimsValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, claims: AuthClaims) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }
}

#[async_trait]
impl ClaimsValidator for StaticClaimsValidator {
    async fn validate(&self, token: &str) -> ProcessResult<AuthClaims> {
        self.tokens.get(token).cloned().ok_or_else(|| {
            AuthError::InvalidToken {
                message: "token is not recognised".to_string(),
            }
            .into()
        })
    }
}
