//! Appointment models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Appointment lifecycle status.
///
/// A flat enumeration, not a guarded state machine: the status update
/// operation may set any status from any other, including backward moves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Canonical wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse the canonical form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(AppointmentStatus::Pending),
            "CONFIRMED" => Some(AppointmentStatus::Confirmed),
            "COMPLETED" => Some(AppointmentStatus::Completed),
            "CANCELLED" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

/// A test reference frozen into an appointment at booking time.
///
/// The price here is the price that was charged; later catalog changes
/// never alter it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestSnapshot {
    pub test_id: String,
    pub name: String,
    pub price: Decimal,
}

/// Contact details captured from the booking form. Independent of the
/// authenticated account's stored profile; the form's values win.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub mobile: Option<String>,
}

/// A raw booking request as delivered by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Selected test ids. Repeats collapse; unknown ids are dropped.
    pub test_ids: Vec<String>,
    /// Requested time (RFC3339). Recorded, not reserved against capacity.
    pub appointment_time: String,
    /// Contact details for this booking
    pub patient: PatientDetails,
    /// Whether the sample is collected at the patient's home
    pub home_visit: bool,
    /// Collection address. Expected when home_visit is set, but a missing
    /// address is accepted.
    pub collection_address: Option<String>,
}

/// A booked appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID
    pub id: String,
    /// Owning patient account ID
    pub patient_id: String,
    /// Deduplicated test snapshots, at least one
    pub tests: Vec<TestSnapshot>,
    /// Requested time (RFC3339)
    pub appointment_time: String,
    /// Contact details captured at booking time
    pub patient: PatientDetails,
    /// Whether the sample is collected at the patient's home
    pub home_visit: bool,
    /// Collection address for home visits
    pub collection_address: Option<String>,
    /// Sum of snapshot prices plus the home-visit surcharge. Never
    /// recomputed after creation.
    pub total_amount: Decimal,
    /// Current status
    pub status: AppointmentStatus,
    /// Report reference, set once the report is ready
    pub report_url: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
