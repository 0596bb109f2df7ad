use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

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
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
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

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Cancelled => "cancelled",
    Completed => "completed",
});

str_enum!(BillingStatus {
    Paid => "paid",
    Outstanding => "outstanding",
});

str_enum!(PaymentMethod {
    Cash => "cash",
    Card => "card",
    Insurance => "insurance",
    BankTransfer => "bank_transfer",
});

str_enum!(ResultStatus {
    Normal => "normal",
    Low => "low",
    High => "high",
    Critical => "critical",
    Unknown => "unknown",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_str() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(AppointmentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = BillingStatus::from_str("refunded").unwrap_err();
        match err {
            DatabaseError::InvalidEnum { field, value } => {
                assert_eq!(field, "BillingStatus");
                assert_eq!(value, "refunded");
            }
            other => panic!("Expected InvalidEnum, got: {other}"),
        }
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
        let parsed: ResultStatus = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, ResultStatus::Critical);
    }
}
