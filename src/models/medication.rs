use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MedicationStatus;

/// A patient's prescribed drug record.
///
/// `name` is free text and may carry dosage or form suffixes
/// ("Lisinopril 10mg"). It is the only field used for safety matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub doctor: Option<String>,
    /// Indication text; several reasons are comma-joined.
    pub reason: Option<String>,
    pub refill_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub status: MedicationStatus,
}

impl Medication {
    /// New active medication with only a display name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            dosage: String::new(),
            frequency: String::new(),
            doctor: None,
            reason: None,
            refill_date: None,
            created_at: chrono::Local::now().naive_local(),
            status: MedicationStatus::Active,
        }
    }

    pub fn with_refill_date(mut self, date: NaiveDate) -> Self {
        self.refill_date = Some(date);
        self
    }

    pub fn with_status(mut self, status: MedicationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Split the comma-joined indication text into trimmed, non-empty reasons.
    pub fn reasons(&self) -> Vec<&str> {
        self.reason
            .as_deref()
            .map(|r| {
                r.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Still being taken (anything but discontinued).
    pub fn is_current(&self) -> bool {
        self.status != MedicationStatus::Discontinued
    }
}
