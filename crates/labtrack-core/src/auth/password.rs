//! Password hashing.

/// Hash a raw password with bcrypt at the default cost. The salt is
/// generated per call and embedded in the output.
pub fn hash_password(raw: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(raw, bcrypt::DEFAULT_COST)
}

/// Verify a raw password against a stored bcrypt hash.
pub fn verify_password(raw: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(raw, hash)
}
