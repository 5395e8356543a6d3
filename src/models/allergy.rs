use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A declared allergen, matched purely by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergy {
    pub id: Uuid,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl Allergy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: chrono::Local::now().naive_local(),
        }
    }
}
