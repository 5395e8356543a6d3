use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(MedicationStatus {
    Prescribed => "prescribed",
    SentToPharmacy => "sent_to_pharmacy",
    PickedUp => "picked_up",
    Active => "active",
    Discontinued => "discontinued",
});

impl MedicationStatus {
    /// Next step in the pharmacy lifecycle.
    /// `Active` and `Discontinued` are terminal and map to themselves.
    pub fn advance(self) -> Self {
        match self {
            Self::Prescribed => Self::SentToPharmacy,
            Self::SentToPharmacy => Self::PickedUp,
            Self::PickedUp => Self::Active,
            Self::Active => Self::Active,
            Self::Discontinued => Self::Discontinued,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn medication_status_round_trip() {
        for (variant, s) in [
            (MedicationStatus::Prescribed, "prescribed"),
            (MedicationStatus::SentToPharmacy, "sent_to_pharmacy"),
            (MedicationStatus::PickedUp, "picked_up"),
            (MedicationStatus::Active, "active"),
            (MedicationStatus::Discontinued, "discontinued"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(MedicationStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(MedicationStatus::from_str("unknown").is_err());
        assert!(MedicationStatus::from_str("").is_err());
        assert!(MedicationStatus::from_str("Active").is_err());
    }

    #[test]
    fn lifecycle_advances_to_active() {
        let mut status = MedicationStatus::Prescribed;
        for _ in 0..5 {
            status = status.advance();
        }
        assert_eq!(status, MedicationStatus::Active);
    }

    #[test]
    fn discontinued_is_terminal() {
        assert_eq!(
            MedicationStatus::Discontinued.advance(),
            MedicationStatus::Discontinued
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&MedicationStatus::SentToPharmacy).unwrap();
        assert_eq!(json, "\"sent_to_pharmacy\"");
    }
}
