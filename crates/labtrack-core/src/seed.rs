//! Idempotent bootstrap routines: reference roles, the administrative
//! account, and the initial catalog.
//!
//! Invoked once at process start, outside the booking and authorization
//! paths. Each routine is safe to run repeatedly.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::auth::hash_password;
use crate::db::{Database, DbError};
use crate::models::{LabTest, Role, User};

/// Seed errors.
#[derive(Error, Debug)]
pub enum SeedError {
    /// Roles were not seeded before the admin account.
    #[error("required role missing from store: {0}")]
    RoleNotFound(String),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type SeedResult<T> = Result<T, SeedError>;

/// Insert the reference roles if absent.
pub fn seed_roles(db: &Database) -> SeedResult<()> {
    db.insert_role(&Role::user())?;
    db.insert_role(&Role::admin())?;
    Ok(())
}

/// Create the administrative account unless the username is taken.
pub fn seed_admin(db: &Database, username: &str, password: &str) -> SeedResult<()> {
    if db.user_exists(username)? {
        return Ok(());
    }

    let admin_role = db
        .find_role(Role::admin().name())?
        .ok_or_else(|| SeedError::RoleNotFound(Role::admin().name().to_string()))?;

    let admin = User::new(
        username.to_string(),
        hash_password(password)?,
        BTreeSet::from([admin_role]),
    );
    db.insert_user(&admin)?;
    info!(username, "admin user seeded");
    Ok(())
}

/// Load the initial catalog when the store is empty.
pub fn seed_catalog(db: &Database) -> SeedResult<()> {
    if db.count_tests()? > 0 {
        return Ok(());
    }

    let rows: [(&str, i64, &str, &str); 9] = [
        ("CBC / Hemogram", 250, "Hematology", "Complete Blood Count"),
        (
            "Lipid Profile",
            600,
            "Biochemistry",
            "Cholesterol, Triglycerides, HDL, LDL",
        ),
        (
            "Liver Function Test (LFT)",
            500,
            "Biochemistry",
            "Bilirubin, SGOT, SGPT",
        ),
        (
            "Kidney Function Test (KFT)",
            500,
            "Biochemistry",
            "Creatinine, Urea, Uric Acid",
        ),
        (
            "Thyroid Profile (T3, T4, TSH)",
            500,
            "Hormones",
            "Thyroid Function Test",
        ),
        ("Blood Sugar (Fasting)", 70, "Diabetes", "Fasting Blood Glucose"),
        (
            "Blood Sugar (PP)",
            70,
            "Diabetes",
            "Post Prandial Blood Glucose",
        ),
        ("Urine Routine", 150, "Pathology", "Urine Analysis"),
        ("Widal", 200, "Serology", "Typhoid Test"),
    ];

    for (name, price, category, description) in rows {
        let mut test = LabTest::new(name.to_string(), Decimal::new(price * 100, 2));
        test.category = Some(category.to_string());
        test.description = Some(description.to_string());
        db.insert_test(&test)?;
    }
    info!("lab tests seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_roles_idempotent() {
        let db = Database::open_in_memory().unwrap();
        seed_roles(&db).unwrap();
        seed_roles(&db).unwrap();

        assert!(db.find_role("USER").unwrap().is_some());
        assert!(db.find_role("ADMIN").unwrap().is_some());
    }

    #[test]
    fn test_seed_admin_creates_once() {
        let db = Database::open_in_memory().unwrap();
        seed_roles(&db).unwrap();

        seed_admin(&db, "admin", "Admin@123").unwrap();
        seed_admin(&db, "admin", "Another@456").unwrap();

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].roles.contains(&Role::admin()));
        assert!(!users[0].roles.contains(&Role::user()));
    }

    #[test]
    fn test_seed_admin_requires_roles() {
        let db = Database::open_in_memory().unwrap();

        let err = seed_admin(&db, "admin", "Admin@123").unwrap_err();
        assert!(matches!(err, SeedError::RoleNotFound(_)));
    }

    #[test]
    fn test_seed_catalog_only_when_empty() {
        let db = Database::open_in_memory().unwrap();

        seed_catalog(&db).unwrap();
        assert_eq!(db.count_tests().unwrap(), 9);

        seed_catalog(&db).unwrap();
        assert_eq!(db.count_tests().unwrap(), 9);
    }

    #[test]
    fn test_seeded_prices() {
        let db = Database::open_in_memory().unwrap();
        seed_catalog(&db).unwrap();

        let tests = db.list_tests(true).unwrap();
        let cbc = tests.iter().find(|t| t.name == "CBC / Hemogram").unwrap();
        assert_eq!(cbc.price, Decimal::new(250_00, 2));
    }
}
