//! Appointment store operations.

use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentStatus, PatientDetails, TestSnapshot};

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        let tests_json = serde_json::to_string(&appointment.tests)?;

        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, tests, appointment_time,
                patient_name, patient_age, patient_gender, patient_mobile,
                home_visit, collection_address, total_amount, status,
                report_url, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                appointment.id,
                appointment.patient_id,
                tests_json,
                appointment.appointment_time,
                appointment.patient.name,
                appointment.patient.age,
                appointment.patient.gender,
                appointment.patient.mobile,
                appointment.home_visit,
                appointment.collection_address,
                appointment.total_amount.to_string(),
                appointment.status.as_str(),
                appointment.report_url,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an appointment's status and report reference. The snapshot
    /// columns (tests, total) are frozen at booking and never rewritten.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                status = ?2,
                report_url = ?3,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                appointment.id,
                appointment.status.as_str(),
                appointment.report_url,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by id.
    pub fn find_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, tests, appointment_time,
                       patient_name, patient_age, patient_gender, patient_mobile,
                       home_visit, collection_address, total_amount, status,
                       report_url, created_at, updated_at
                FROM appointments
                WHERE id = ?
                "#,
                [id],
                map_appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a patient's appointments, newest first.
    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, tests, appointment_time,
                   patient_name, patient_age, patient_gender, patient_mobile,
                   home_visit, collection_address, total_amount, status,
                   report_url, created_at, updated_at
            FROM appointments
            WHERE patient_id = ?
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], map_appointment_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// List every appointment.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, tests, appointment_time,
                   patient_name, patient_age, patient_gender, patient_mobile,
                   home_visit, collection_address, total_amount, status,
                   report_url, created_at, updated_at
            FROM appointments
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([], map_appointment_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    patient_id: String,
    tests: String,
    appointment_time: String,
    patient_name: Option<String>,
    patient_age: Option<u32>,
    patient_gender: Option<String>,
    patient_mobile: Option<String>,
    home_visit: bool,
    collection_address: Option<String>,
    total_amount: String,
    status: String,
    report_url: Option<String>,
    created_at: String,
    updated_at: String,
}

fn map_appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        tests: row.get(2)?,
        appointment_time: row.get(3)?,
        patient_name: row.get(4)?,
        patient_age: row.get(5)?,
        patient_gender: row.get(6)?,
        patient_mobile: row.get(7)?,
        home_visit: row.get(8)?,
        collection_address: row.get(9)?,
        total_amount: row.get(10)?,
        status: row.get(11)?,
        report_url: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let tests: Vec<TestSnapshot> = serde_json::from_str(&row.tests)?;
        let status = AppointmentStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown status: {}", row.status)))?;

        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            tests,
            appointment_time: row.appointment_time,
            patient: PatientDetails {
                name: row.patient_name,
                age: row.patient_age,
                gender: row.patient_gender,
                mobile: row.patient_mobile,
            },
            home_visit: row.home_visit,
            collection_address: row.collection_address,
            total_amount: row.total_amount.parse::<Decimal>()?,
            status,
            report_url: row.report_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use std::collections::BTreeSet;

    fn setup_db_with_patient() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        db.insert_role(&Role::user()).unwrap();

        let user = User::new(
            "alice".into(),
            "$2b$12$hash".into(),
            BTreeSet::from([Role::user()]),
        );
        db.insert_user(&user).unwrap();
        let id = user.id;
        (db, id)
    }

    fn make_appointment(patient_id: &str) -> Appointment {
        let now = chrono::Utc::now().to_rfc3339();
        Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            tests: vec![TestSnapshot {
                test_id: "t-1".into(),
                name: "CBC / Hemogram".into(),
                price: Decimal::new(250_00, 2),
            }],
            appointment_time: "2026-03-01T09:30:00Z".into(),
            patient: PatientDetails {
                name: Some("Alice A".into()),
                age: Some(34),
                gender: Some("F".into()),
                mobile: Some("9876500000".into()),
            },
            home_visit: false,
            collection_address: None,
            total_amount: Decimal::new(250_00, 2),
            status: AppointmentStatus::Pending,
            report_url: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let (db, patient_id) = setup_db_with_patient();

        let appointment = make_appointment(&patient_id);
        db.insert_appointment(&appointment).unwrap();

        let retrieved = db.find_appointment(&appointment.id).unwrap().unwrap();
        assert_eq!(retrieved.total_amount, Decimal::new(250_00, 2));
        assert_eq!(retrieved.status, AppointmentStatus::Pending);
        assert_eq!(retrieved.tests.len(), 1);
        assert_eq!(retrieved.patient.name, Some("Alice A".into()));
    }

    #[test]
    fn test_update_touches_only_status_and_report() {
        let (db, patient_id) = setup_db_with_patient();

        let mut appointment = make_appointment(&patient_id);
        db.insert_appointment(&appointment).unwrap();

        appointment.status = AppointmentStatus::Completed;
        appointment.report_url = Some("https://reports.example/a1.pdf".into());
        assert!(db.update_appointment(&appointment).unwrap());

        let retrieved = db.find_appointment(&appointment.id).unwrap().unwrap();
        assert_eq!(retrieved.status, AppointmentStatus::Completed);
        assert_eq!(
            retrieved.report_url,
            Some("https://reports.example/a1.pdf".into())
        );
        assert_eq!(retrieved.total_amount, Decimal::new(250_00, 2));
    }

    #[test]
    fn test_list_for_patient_filters_by_owner() {
        let (db, patient_id) = setup_db_with_patient();

        let other = User::new(
            "bob".into(),
            "$2b$12$hash".into(),
            BTreeSet::from([Role::user()]),
        );
        db.insert_user(&other).unwrap();

        db.insert_appointment(&make_appointment(&patient_id)).unwrap();
        db.insert_appointment(&make_appointment(&patient_id)).unwrap();
        db.insert_appointment(&make_appointment(&other.id)).unwrap();

        assert_eq!(
            db.list_appointments_for_patient(&patient_id).unwrap().len(),
            2
        );
        assert_eq!(db.list_appointments().unwrap().len(), 3);
    }
}
