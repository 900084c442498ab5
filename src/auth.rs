//! Bearer-token verification.
//!
//! Authentication itself is delegated to an external identity provider; this
//! module only verifies the HS256 tokens it mints and exposes the shopper's
//! identity to handlers through an extractor.

use crate::{errors::ServiceError, AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity-provider subject id
    pub sub: String,
    /// Shopper email as asserted by the identity provider
    #[serde(default)]
    pub email: String,
    pub exp: usize,
}

/// Verifies bearer tokens minted by the identity provider.
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::Unauthorized(format!("invalid bearer token: {}", e)))
    }
}

/// The authenticated shopper, extracted from the `Authorization` header.
///
/// Absence of a valid token is a 401 before any checkout logic runs — the
/// "login required" prompt on the storefront side.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("login required".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("expected a bearer token".to_string()))?;

        let claims = state.auth.verify(token)?;

        Ok(AuthenticatedUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
