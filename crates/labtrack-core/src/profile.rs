//! Self profile read and partial update.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{ProfilePatch, UserProfile};

/// Profile errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The token named an account the store no longer has.
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

/// Fetch the profile projection for an authenticated username.
pub fn get_profile(db: &Database, username: &str) -> ProfileResult<UserProfile> {
    let user = db
        .find_user_by_username(username)?
        .ok_or_else(|| ProfileError::UserNotFound(username.to_string()))?;
    Ok(UserProfile::from(&user))
}

/// Apply a partial patch to the authenticated user's profile. Absent
/// fields keep their stored values.
pub fn update_profile(
    db: &Database,
    username: &str,
    patch: &ProfilePatch,
) -> ProfileResult<UserProfile> {
    let mut user = db
        .find_user_by_username(username)?
        .ok_or_else(|| ProfileError::UserNotFound(username.to_string()))?;

    patch.apply(&mut user);
    db.update_user(&user)?;
    Ok(UserProfile::from(&user))
}
