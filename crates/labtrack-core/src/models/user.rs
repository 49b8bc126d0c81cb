//! User, role, and identity models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Canonical prefix for role names. Bare names gain it on construction so
/// access checks match regardless of how roles were seeded.
pub const ROLE_PREFIX: &str = "ROLE_";

/// A named permission group (e.g. `ROLE_USER`, `ROLE_ADMIN`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from a name, normalizing to the canonical prefix.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        if name.starts_with(ROLE_PREFIX) {
            Self(name.to_string())
        } else {
            Self(format!("{}{}", ROLE_PREFIX, name))
        }
    }

    /// The default role granted at registration.
    pub fn user() -> Self {
        Self::new("USER")
    }

    /// The administrative role.
    pub fn admin() -> Self {
        Self::new("ADMIN")
    }

    /// The canonical role name, prefix included.
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// The resolved principal after a successful login or token validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl Identity {
    pub fn new(username: String, roles: BTreeSet<Role>) -> Self {
        Self { username, roles }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

/// A registered account with credentials, role set, and profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique account ID
    pub id: String,
    /// Unique login name
    pub username: String,
    /// One-way salted password hash
    pub password_hash: String,
    /// Disabled accounts cannot authenticate
    pub enabled: bool,
    /// Profile: display name
    pub full_name: Option<String>,
    /// Profile: age in years
    pub age: Option<u32>,
    /// Profile: gender
    pub gender: Option<String>,
    /// Profile: postal address
    pub address: Option<String>,
    /// Profile: contact number
    pub phone_number: Option<String>,
    /// Granted roles. Non-empty after registration.
    pub roles: BTreeSet<Role>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl User {
    /// Create a new enabled user with the given roles and an empty profile.
    pub fn new(username: String, password_hash: String, roles: BTreeSet<Role>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash,
            enabled: true,
            full_name: None,
            age: None,
            gender: None,
            address: None,
            phone_number: None,
            roles,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The principal this account resolves to when authenticated.
    pub fn identity(&self) -> Identity {
        Identity::new(self.username.clone(), self.roles.clone())
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Outward account projection. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub enabled: bool,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub roles: Vec<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            enabled: user.enabled,
            full_name: user.full_name.clone(),
            age: user.age,
            gender: user.gender.clone(),
            address: user.address.clone(),
            phone_number: user.phone_number.clone(),
            roles: user.roles.iter().map(|r| r.name().to_string()).collect(),
        }
    }
}

/// Partial profile update. Absent fields leave existing values untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfilePatch {
    /// Apply the present fields onto a user record.
    pub fn apply(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(gender) = &self.gender {
            user.gender = Some(gender.clone());
        }
        if let Some(address) = &self.address {
            user.address = Some(address.clone());
        }
        if let Some(phone_number) = &self.phone_number {
            user.phone_number = Some(phone_number.clone());
        }
        user.touch();
    }
}
