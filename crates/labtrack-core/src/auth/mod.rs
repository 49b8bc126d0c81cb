//! Authentication: credential verification, registration, and bearer tokens.

mod password;
mod token;

pub use password::*;
pub use token::*;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Database, DbError};
use crate::models::{Identity, Role, User};

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username already exists: {0}")]
    UserAlreadyExists(String),

    /// Missing reference role: a configuration-integrity fault, not a user
    /// error. Aborts the operation rather than defaulting to an undeclared
    /// role.
    #[error("required role missing from store: {0}")]
    RoleNotFound(String),

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token encoding failed: {0}")]
    TokenEncoding(jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Token issuance settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC signing secret
    pub token_secret: String,
    /// Token lifetime in seconds from issuance
    pub token_ttl_secs: i64,
}

impl AuthConfig {
    pub fn new(token_secret: impl Into<String>, token_ttl_secs: i64) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl_secs,
        }
    }
}

/// Verifies credentials, registers accounts, and issues/validates tokens.
pub struct Authenticator<'a> {
    db: &'a Database,
    config: &'a AuthConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(db: &'a Database, config: &'a AuthConfig) -> Self {
        Self { db, config }
    }

    /// Verify a username/password pair against the credential store.
    ///
    /// Absent, disabled, and wrong-password all collapse into
    /// [`AuthError::InvalidCredentials`].
    pub fn authenticate(&self, username: &str, password: &str) -> AuthResult<Identity> {
        let user = match self.db.find_user_by_username(username)? {
            Some(user) => user,
            None => {
                warn!(username, "login failed: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.enabled {
            warn!(username, "login failed: account disabled");
            return Err(AuthError::InvalidCredentials);
        }
        if !verify_password(password, &user.password_hash)? {
            warn!(username, "login failed: bad password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user.identity())
    }

    /// Create a new account with the default role and return its identity,
    /// equivalent to a successful login.
    pub fn register(&self, username: &str, password: &str) -> AuthResult<Identity> {
        if self.db.user_exists(username)? {
            return Err(AuthError::UserAlreadyExists(username.to_string()));
        }

        let default_role = self
            .db
            .find_role(Role::user().name())?
            .ok_or_else(|| AuthError::RoleNotFound(Role::user().name().to_string()))?;

        let user = User::new(
            username.to_string(),
            hash_password(password)?,
            BTreeSet::from([default_role]),
        );
        self.db.insert_user(&user)?;
        info!(username, "user registered");

        Ok(user.identity())
    }

    /// Issue a signed, time-bounded bearer token for an identity.
    pub fn issue_token(&self, identity: &Identity) -> AuthResult<String> {
        token::issue(identity, self.config)
    }

    /// Recover the identity encoded in a token without a store lookup.
    pub fn validate_token(&self, token: &str) -> AuthResult<Identity> {
        token::validate(token, self.config)
    }
}
