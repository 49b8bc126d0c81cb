//! Booking engine: price resolution, appointment creation, and status
//! tracking.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::db::{Database, DbError};
use crate::models::{
    Appointment, AppointmentStatus, BookingRequest, TestSnapshot, User,
};

/// Flat fee added when the sample is collected at the patient's home.
pub fn home_visit_surcharge() -> Decimal {
    Decimal::new(100_00, 2)
}

/// Booking errors.
#[derive(Error, Debug)]
pub enum BookingError {
    /// The requested ids resolved to nothing bookable.
    #[error("no valid tests selected")]
    NoValidTestsSelected,

    #[error("appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Converts a raw test selection into a priced, validated appointment and
/// tracks its status afterwards.
pub struct BookingEngine<'a> {
    db: &'a Database,
}

impl<'a> BookingEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Book an appointment for a patient.
    ///
    /// Requested ids are deduplicated and resolved against the catalog;
    /// unknown ids are dropped silently. Inactive tests resolve like active
    /// ones, since the active flag only gates the public listing. The total
    /// is the sum of the resolved prices at this moment, plus the fixed
    /// surcharge for home visits, and is frozen into the appointment.
    ///
    /// A home visit with no collection address is accepted.
    pub fn book(&self, patient: &User, request: BookingRequest) -> BookingResult<Appointment> {
        let unique_ids: Vec<String> = request
            .test_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let tests = self.db.find_tests_by_ids(&unique_ids)?;
        if tests.is_empty() {
            return Err(BookingError::NoValidTestsSelected);
        }

        let snapshots: Vec<TestSnapshot> = tests.iter().map(|t| t.snapshot()).collect();
        let tests_total: Decimal = snapshots.iter().map(|s| s.price).sum();
        let mut total_amount = if request.home_visit {
            tests_total + home_visit_surcharge()
        } else {
            tests_total
        };
        total_amount.rescale(2);

        let now = chrono::Utc::now().to_rfc3339();
        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient.id.clone(),
            tests: snapshots,
            appointment_time: request.appointment_time,
            patient: request.patient,
            home_visit: request.home_visit,
            collection_address: request.collection_address,
            total_amount,
            status: AppointmentStatus::Pending,
            report_url: None,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.insert_appointment(&appointment)?;
        info!(
            appointment_id = %appointment.id,
            patient = %patient.username,
            total = %appointment.total_amount,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Apply a status and/or report reference to an appointment.
    ///
    /// Fields that are `Some` overwrite unconditionally; there is no
    /// transition table, so any status may replace any other, backward
    /// moves included.
    pub fn update_status(
        &self,
        appointment_id: &str,
        status: Option<AppointmentStatus>,
        report_url: Option<String>,
    ) -> BookingResult<Appointment> {
        let mut appointment = self
            .db
            .find_appointment(appointment_id)?
            .ok_or_else(|| BookingError::AppointmentNotFound(appointment_id.to_string()))?;

        if let Some(status) = status {
            appointment.status = status;
        }
        if let Some(report_url) = report_url {
            appointment.report_url = Some(report_url);
        }
        appointment.touch();

        self.db.update_appointment(&appointment)?;
        info!(
            appointment_id = %appointment.id,
            status = appointment.status.as_str(),
            "appointment updated"
        );
        Ok(appointment)
    }

    /// A patient's appointments.
    pub fn history(&self, patient_id: &str) -> BookingResult<Vec<Appointment>> {
        Ok(self.db.list_appointments_for_patient(patient_id)?)
    }

    /// Every appointment, for administrative review.
    pub fn all_appointments(&self) -> BookingResult<Vec<Appointment>> {
        Ok(self.db.list_appointments()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabTest, PatientDetails, Role};

    fn setup() -> (Database, User, LabTest, LabTest) {
        let db = Database::open_in_memory().unwrap();
        db.insert_role(&Role::user()).unwrap();

        let patient = User::new(
            "alice".into(),
            "$2b$12$hash".into(),
            BTreeSet::from([Role::user()]),
        );
        db.insert_user(&patient).unwrap();

        let cbc = LabTest::new("CBC / Hemogram".into(), Decimal::new(250_00, 2));
        let lipid = LabTest::new("Lipid Profile".into(), Decimal::new(600_00, 2));
        db.insert_test(&cbc).unwrap();
        db.insert_test(&lipid).unwrap();

        (db, patient, cbc, lipid)
    }

    fn request(test_ids: Vec<String>, home_visit: bool) -> BookingRequest {
        BookingRequest {
            test_ids,
            appointment_time: "2026-03-01T09:30:00Z".into(),
            patient: PatientDetails {
                name: Some("Alice A".into()),
                age: Some(34),
                gender: Some("F".into()),
                mobile: Some("9876500000".into()),
            },
            home_visit,
            collection_address: home_visit.then(|| "12 Lab Street".into()),
        }
    }

    #[test]
    fn test_home_visit_total_and_initial_status() {
        let (db, patient, cbc, lipid) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine
            .book(&patient, request(vec![cbc.id, lipid.id], true))
            .unwrap();

        assert_eq!(appointment.total_amount, Decimal::new(950_00, 2));
        assert_eq!(appointment.total_amount.to_string(), "950.00");
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.tests.len(), 2);
    }

    #[test]
    fn test_walk_in_total_has_no_surcharge() {
        let (db, patient, cbc, lipid) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine
            .book(&patient, request(vec![cbc.id, lipid.id], false))
            .unwrap();

        assert_eq!(appointment.total_amount, Decimal::new(850_00, 2));
    }

    #[test]
    fn test_repeated_ids_collapse() {
        let (db, patient, cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine
            .book(
                &patient,
                request(vec![cbc.id.clone(), cbc.id.clone(), cbc.id], false),
            )
            .unwrap();

        assert_eq!(appointment.tests.len(), 1);
        assert_eq!(appointment.total_amount, Decimal::new(250_00, 2));
    }

    #[test]
    fn test_unknown_ids_dropped_silently() {
        let (db, patient, cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine
            .book(&patient, request(vec![cbc.id, "no-such-test".into()], false))
            .unwrap();

        assert_eq!(appointment.tests.len(), 1);
    }

    #[test]
    fn test_nothing_resolvable_is_an_error() {
        let (db, patient, _, _) = setup();
        let engine = BookingEngine::new(&db);

        assert!(matches!(
            engine.book(&patient, request(vec![], false)),
            Err(BookingError::NoValidTestsSelected)
        ));
        assert!(matches!(
            engine.book(&patient, request(vec!["ghost".into()], true)),
            Err(BookingError::NoValidTestsSelected)
        ));
    }

    #[test]
    fn test_inactive_test_bookable_by_direct_id() {
        let (db, patient, _, _) = setup();

        let mut widal = LabTest::new("Widal".into(), Decimal::new(200_00, 2));
        widal.active = false;
        db.insert_test(&widal).unwrap();

        let engine = BookingEngine::new(&db);
        let appointment = engine.book(&patient, request(vec![widal.id], false)).unwrap();
        assert_eq!(appointment.total_amount, Decimal::new(200_00, 2));
    }

    #[test]
    fn test_home_visit_without_address_is_accepted() {
        let (db, patient, cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let mut req = request(vec![cbc.id], true);
        req.collection_address = None;

        let appointment = engine.book(&patient, req).unwrap();
        assert!(appointment.home_visit);
        assert_eq!(appointment.collection_address, None);
        assert_eq!(appointment.total_amount, Decimal::new(350_00, 2));
    }

    #[test]
    fn test_total_frozen_against_later_price_changes() {
        let (db, patient, mut cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine
            .book(&patient, request(vec![cbc.id.clone()], false))
            .unwrap();

        cbc.price = Decimal::new(999_00, 2);
        db.update_test(&cbc).unwrap();

        let stored = db.find_appointment(&appointment.id).unwrap().unwrap();
        assert_eq!(stored.total_amount, Decimal::new(250_00, 2));
        assert_eq!(stored.tests[0].price, Decimal::new(250_00, 2));
    }

    #[test]
    fn test_update_status_only() {
        let (db, patient, cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine.book(&patient, request(vec![cbc.id], false)).unwrap();
        let updated = engine
            .update_status(&appointment.id, Some(AppointmentStatus::Confirmed), None)
            .unwrap();

        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.report_url, None);
    }

    #[test]
    fn test_update_report_only_leaves_status() {
        let (db, patient, cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine.book(&patient, request(vec![cbc.id], false)).unwrap();
        let updated = engine
            .update_status(
                &appointment.id,
                None,
                Some("https://reports.example/a1.pdf".into()),
            )
            .unwrap();

        assert_eq!(updated.status, AppointmentStatus::Pending);
        assert_eq!(
            updated.report_url,
            Some("https://reports.example/a1.pdf".into())
        );
    }

    #[test]
    fn test_backward_status_moves_allowed() {
        let (db, patient, cbc, _) = setup();
        let engine = BookingEngine::new(&db);

        let appointment = engine.book(&patient, request(vec![cbc.id], false)).unwrap();
        engine
            .update_status(&appointment.id, Some(AppointmentStatus::Completed), None)
            .unwrap();
        let reverted = engine
            .update_status(&appointment.id, Some(AppointmentStatus::Pending), None)
            .unwrap();

        assert_eq!(reverted.status, AppointmentStatus::Pending);
    }

    #[test]
    fn test_update_unknown_appointment() {
        let (db, _, _, _) = setup();
        let engine = BookingEngine::new(&db);

        assert!(matches!(
            engine.update_status("ghost", Some(AppointmentStatus::Confirmed), None),
            Err(BookingError::AppointmentNotFound(_))
        ));
    }

    #[test]
    fn test_history_is_per_patient() {
        let (db, patient, cbc, lipid) = setup();

        let other = User::new(
            "bob".into(),
            "$2b$12$hash".into(),
            BTreeSet::from([Role::user()]),
        );
        db.insert_user(&other).unwrap();

        let engine = BookingEngine::new(&db);
        engine
            .book(&patient, request(vec![cbc.id.clone()], false))
            .unwrap();
        engine.book(&patient, request(vec![lipid.id], false)).unwrap();
        engine.book(&other, request(vec![cbc.id], false)).unwrap();

        assert_eq!(engine.history(&patient.id).unwrap().len(), 2);
        assert_eq!(engine.history(&other.id).unwrap().len(), 1);
        assert_eq!(engine.all_appointments().unwrap().len(), 3);
    }
}
