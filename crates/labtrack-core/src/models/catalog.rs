//! Lab test catalog models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TestSnapshot;

/// A bookable diagnostic test in the catalog.
///
/// Inactive tests are hidden from the public listing but remain bookable
/// when selected directly by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabTest {
    /// Unique test ID
    pub id: String,
    /// Unique display name (e.g. "Lipid Profile")
    pub name: String,
    /// Price in currency units
    pub price: Decimal,
    /// Category label (e.g. "Biochemistry")
    pub category: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Whether this test appears in the public listing
    pub active: bool,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl LabTest {
    /// Create a new active test with required fields.
    pub fn new(name: String, price: Decimal) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            price,
            category: None,
            description: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Capture the id, name, and current price for embedding in an
    /// appointment. The snapshot is immune to later catalog edits.
    pub fn snapshot(&self) -> TestSnapshot {
        TestSnapshot {
            test_id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
        }
    }
}
