//! Catalog administration: listing and CRUD over lab tests.
//!
//! Pass-through against the catalog store; the facade gates every write
//! behind the admin role before it reaches here.

use thiserror::Error;
use tracing::info;

use crate::db::{Database, DbError};
use crate::models::LabTest;

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("lab test not found: {0}")]
    TestNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Administrative catalog operations.
pub struct CatalogAdmin<'a> {
    db: &'a Database,
}

impl<'a> CatalogAdmin<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Publicly-listed tests only.
    pub fn list_active(&self) -> CatalogResult<Vec<LabTest>> {
        Ok(self.db.list_tests(true)?)
    }

    /// Every test, inactive included.
    pub fn list_all(&self) -> CatalogResult<Vec<LabTest>> {
        Ok(self.db.list_tests(false)?)
    }

    /// Add a new test to the catalog.
    pub fn create(&self, test: LabTest) -> CatalogResult<LabTest> {
        self.db.insert_test(&test)?;
        info!(test_id = %test.id, name = %test.name, "lab test created");
        Ok(test)
    }

    /// Overwrite a test's definition: name, price, category, description,
    /// and active flag all come from the supplied record.
    pub fn update(&self, id: &str, updated: &LabTest) -> CatalogResult<LabTest> {
        let mut test = self
            .db
            .find_test(id)?
            .ok_or_else(|| CatalogError::TestNotFound(id.to_string()))?;

        test.name = updated.name.clone();
        test.price = updated.price;
        test.category = updated.category.clone();
        test.description = updated.description.clone();
        test.active = updated.active;

        self.db.update_test(&test)?;
        Ok(test)
    }

    /// Remove a test from the catalog. Appointments keep their snapshots.
    pub fn delete(&self, id: &str) -> CatalogResult<bool> {
        let deleted = self.db.delete_test(id)?;
        if deleted {
            info!(test_id = id, "lab test deleted");
        }
        Ok(deleted)
    }
}
