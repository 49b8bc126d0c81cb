//! Bearer token encoding and validation.
//!
//! Tokens are HS256 JWTs carrying the username and role claims. Validation
//! is a pure computation: the token is the source of truth for role claims
//! between issuance and expiry, so a role change or account disablement
//! only takes effect once outstanding tokens expire. That staleness window
//! equals the configured token lifetime.

use std::collections::BTreeSet;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthConfig, AuthError, AuthResult};
use crate::models::{Identity, Role};

/// JWT claim set.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Normalized role names
    pub roles: Vec<String>,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Encode a signed token for an identity, expiring after the configured
/// lifetime.
pub fn issue(identity: &Identity, config: &AuthConfig) -> AuthResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: identity.username.clone(),
        roles: identity
            .roles
            .iter()
            .map(|r| r.name().to_string())
            .collect(),
        iat: now,
        exp: now + config.token_ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(AuthError::TokenEncoding)
}

/// Decode and verify a token, recovering the identity it was issued for.
/// Fails with [`AuthError::InvalidToken`] on a bad signature or expiry.
pub fn validate(token: &str, config: &AuthConfig) -> AuthResult<Identity> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.token_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let roles: BTreeSet<Role> = data.claims.roles.iter().map(|r| Role::new(r)).collect();
    Ok(Identity::new(data.claims.sub, roles))
}
