//! Access control gate.
//!
//! A static mapping from operation to required role, evaluated before any
//! store or engine is invoked. Role membership is plain set membership on
//! the caller's identity; there is no dynamic policy.

use thiserror::Error;

use crate::models::{Identity, Role};

/// Access errors.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("operation not permitted for this role")]
    Forbidden,
}

/// Every gated operation the core exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Public catalog read of active tests
    ListActiveTests,
    /// Self profile read
    GetProfile,
    /// Self profile partial update
    UpdateProfile,
    /// Book an appointment
    BookAppointment,
    /// Own booking history
    MyHistory,
    /// Global appointment list
    ListAllAppointments,
    /// Appointment status / report update
    UpdateAppointmentStatus,
    /// Catalog read including inactive tests
    ListAllTests,
    /// Catalog writes
    CreateTest,
    UpdateTest,
    DeleteTest,
    /// Account listing
    ListUsers,
}

/// What an operation demands of the caller.
enum Requirement {
    Public,
    Authenticated,
    HasRole(Role),
}

fn requirement(operation: Operation) -> Requirement {
    use Operation::*;
    match operation {
        ListActiveTests => Requirement::Public,
        GetProfile | UpdateProfile => Requirement::Authenticated,
        BookAppointment | MyHistory => Requirement::HasRole(Role::user()),
        ListAllAppointments | UpdateAppointmentStatus | ListAllTests | CreateTest
        | UpdateTest | DeleteTest | ListUsers => Requirement::HasRole(Role::admin()),
    }
}

/// Check an operation against the caller's identity, if any.
pub fn check(identity: Option<&Identity>, operation: Operation) -> Result<(), AccessError> {
    match requirement(operation) {
        Requirement::Public => Ok(()),
        Requirement::Authenticated => match identity {
            Some(_) => Ok(()),
            None => Err(AccessError::Unauthenticated),
        },
        Requirement::HasRole(role) => match identity {
            Some(identity) if identity.has_role(&role) => Ok(()),
            Some(_) => Err(AccessError::Forbidden),
            None => Err(AccessError::Unauthenticated),
        },
    }
}
