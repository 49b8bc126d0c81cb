//! Labtrack Core Library
//!
//! Appointment booking and authorization core for a diagnostic lab:
//! patients register, authenticate, and book lab tests (optionally with
//! home collection); staff manage the catalog and drive appointments
//! through to report delivery.
//!
//! # Architecture
//!
//! ```text
//!  credentials / token
//!          │
//!          ▼
//!   ┌─────────────┐     ┌────────────────┐
//!   │Authenticator│────▶│  Access Gate   │  operation → required role
//!   └─────────────┘     └───────┬────────┘
//!                               │ permitted
//!          ┌────────────────────┼────────────────────┐
//!          ▼                    ▼                    ▼
//!   ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//!   │   Profile   │     │BookingEngine │     │ CatalogAdmin │
//!   └──────┬──────┘     └──────┬───────┘     └──────┬───────┘
//!          │                   │                    │
//!          └───────────────────┼────────────────────┘
//!                              ▼
//!                     SQLite store (users / lab_tests / appointments)
//! ```
//!
//! Booking resolves the selected test ids against the catalog, freezes a
//! price snapshot into the appointment, and records the requested time.
//! There is no capacity model: any number of patients may request the same
//! time window.
//!
//! # Modules
//!
//! - [`db`]: SQLite store layer (credentials, catalog, appointments)
//! - [`models`]: Domain types (User, Role, LabTest, Appointment, etc.)
//! - [`auth`]: Password hashing and bearer tokens
//! - [`access`]: Static operation-to-role gate
//! - [`booking`]: Pricing and appointment lifecycle
//! - [`catalog`]: Administrative catalog CRUD
//! - [`profile`]: Self profile read / partial update
//! - [`seed`]: Idempotent bootstrap (roles, admin account, catalog)

pub mod access;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod db;
pub mod models;
pub mod profile;
pub mod seed;

// Re-export commonly used types
pub use access::{AccessError, Operation};
pub use auth::{AuthConfig, AuthError, Authenticator};
pub use booking::{home_visit_surcharge, BookingEngine, BookingError};
pub use catalog::{CatalogAdmin, CatalogError};
pub use db::Database;
pub use models::{
    Appointment, AppointmentStatus, BookingRequest, Identity, LabTest, PatientDetails,
    ProfilePatch, Role, TestSnapshot, User, UserProfile,
};
pub use profile::ProfileError;
pub use seed::SeedError;

use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// Core Error Type
// =========================================================================

/// Any failure the facade can surface. Each variant stays distinct so the
/// transport layer can map them to its own response codes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Db(#[from] db::DbError),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        CoreError::LockPoisoned
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service facade over one shared database.
///
/// The transport layer hands every authenticated call an opaque bearer
/// token; the facade validates it, checks the operation against the access
/// gate, and only then touches a store or engine.
pub struct LabCore {
    db: Arc<Mutex<Database>>,
    config: AuthConfig,
}

impl LabCore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, config: AuthConfig) -> Result<Self, CoreError> {
        let db = Database::open(path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    /// Create an in-memory instance (for testing).
    pub fn open_in_memory(config: AuthConfig) -> Result<Self, CoreError> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    /// Run the bootstrap routines: reference roles, the administrative
    /// account, and the initial catalog. Idempotent.
    pub fn bootstrap(&self, admin_username: &str, admin_password: &str) -> Result<(), CoreError> {
        let db = self.db.lock()?;
        seed::seed_roles(&db)?;
        seed::seed_admin(&db, admin_username, admin_password)?;
        seed::seed_catalog(&db)?;
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Login with username and password; returns a bearer token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, CoreError> {
        let db = self.db.lock()?;
        let auth = Authenticator::new(&db, &self.config);
        let identity = auth.authenticate(username, password)?;
        Ok(auth.issue_token(&identity)?)
    }

    /// Register a new patient account; returns a bearer token, so
    /// registration doubles as a first login.
    pub fn register(&self, username: &str, password: &str) -> Result<String, CoreError> {
        let db = self.db.lock()?;
        let auth = Authenticator::new(&db, &self.config);
        let identity = auth.register(username, password)?;
        Ok(auth.issue_token(&identity)?)
    }

    // =========================================================================
    // Public Catalog
    // =========================================================================

    /// The publicly-listed catalog: active tests only.
    pub fn list_active_tests(&self) -> Result<Vec<LabTest>, CoreError> {
        access::check(None, Operation::ListActiveTests)?;
        let db = self.db.lock()?;
        Ok(CatalogAdmin::new(&db).list_active()?)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Book an appointment for the token's account.
    pub fn book(&self, token: &str, request: BookingRequest) -> Result<Appointment, CoreError> {
        let db = self.db.lock()?;
        let identity = self.authorize(&db, token, Operation::BookAppointment)?;
        let patient = self.acting_user(&db, &identity)?;
        Ok(BookingEngine::new(&db).book(&patient, request)?)
    }

    /// The token's own booking history.
    pub fn my_history(&self, token: &str) -> Result<Vec<Appointment>, CoreError> {
        let db = self.db.lock()?;
        let identity = self.authorize(&db, token, Operation::MyHistory)?;
        let patient = self.acting_user(&db, &identity)?;
        Ok(BookingEngine::new(&db).history(&patient.id)?)
    }

    /// The token's profile projection.
    pub fn get_profile(&self, token: &str) -> Result<UserProfile, CoreError> {
        let db = self.db.lock()?;
        let identity = self.authorize(&db, token, Operation::GetProfile)?;
        Ok(profile::get_profile(&db, &identity.username)?)
    }

    /// Partially update the token's profile.
    pub fn update_profile(
        &self,
        token: &str,
        patch: ProfilePatch,
    ) -> Result<UserProfile, CoreError> {
        let db = self.db.lock()?;
        let identity = self.authorize(&db, token, Operation::UpdateProfile)?;
        Ok(profile::update_profile(&db, &identity.username, &patch)?)
    }

    // =========================================================================
    // Administrative Operations
    // =========================================================================

    /// Every appointment in the system.
    pub fn admin_list_appointments(&self, token: &str) -> Result<Vec<Appointment>, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::ListAllAppointments)?;
        Ok(BookingEngine::new(&db).all_appointments()?)
    }

    /// Overwrite an appointment's status and/or report reference.
    pub fn admin_update_status(
        &self,
        token: &str,
        appointment_id: &str,
        status: Option<AppointmentStatus>,
        report_url: Option<String>,
    ) -> Result<Appointment, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::UpdateAppointmentStatus)?;
        Ok(BookingEngine::new(&db).update_status(appointment_id, status, report_url)?)
    }

    /// Every catalog entry, inactive included.
    pub fn admin_list_tests(&self, token: &str) -> Result<Vec<LabTest>, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::ListAllTests)?;
        Ok(CatalogAdmin::new(&db).list_all()?)
    }

    /// Add a catalog entry.
    pub fn admin_create_test(&self, token: &str, test: LabTest) -> Result<LabTest, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::CreateTest)?;
        Ok(CatalogAdmin::new(&db).create(test)?)
    }

    /// Overwrite a catalog entry's definition.
    pub fn admin_update_test(
        &self,
        token: &str,
        test_id: &str,
        updated: &LabTest,
    ) -> Result<LabTest, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::UpdateTest)?;
        Ok(CatalogAdmin::new(&db).update(test_id, updated)?)
    }

    /// Remove a catalog entry.
    pub fn admin_delete_test(&self, token: &str, test_id: &str) -> Result<bool, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::DeleteTest)?;
        Ok(CatalogAdmin::new(&db).delete(test_id)?)
    }

    /// Every registered account, as hash-free projections.
    pub fn admin_list_users(&self, token: &str) -> Result<Vec<UserProfile>, CoreError> {
        let db = self.db.lock()?;
        self.authorize(&db, token, Operation::ListUsers)?;
        let users = db.list_users()?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn authorize(
        &self,
        db: &Database,
        token: &str,
        operation: Operation,
    ) -> Result<Identity, CoreError> {
        let auth = Authenticator::new(db, &self.config);
        let identity = auth.validate_token(token)?;
        access::check(Some(&identity), operation)?;
        Ok(identity)
    }

    /// Resolve the token's account row. Fails when the store and the token
    /// disagree about the account's existence.
    fn acting_user(&self, db: &Database, identity: &Identity) -> Result<User, CoreError> {
        db.find_user_by_username(&identity.username)?
            .ok_or_else(|| ProfileError::UserNotFound(identity.username.clone()).into())
    }
}
