pub mod allergy;
pub mod enums;
pub mod medication;

pub use allergy::Allergy;
pub use enums::MedicationStatus;
pub use medication::Medication;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
