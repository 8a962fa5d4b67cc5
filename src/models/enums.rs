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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
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
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Admin => "admin",
});

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Canceled => "canceled",
});

impl AppointmentStatus {
    /// Edges of the appointment lifecycle. `Completed` and `Canceled` are terminal.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Canceled) | (Confirmed, Completed) | (Confirmed, Canceled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_invalid_enum() {
        let err = Role::from_str("superuser").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&AppointmentStatus::Canceled).unwrap();
        assert_eq!(json, "\"canceled\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::Confirmed);
    }

    #[test]
    fn allowed_transitions() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Canceled));
    }

    #[test]
    fn rejected_transitions() {
        use AppointmentStatus::*;
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Confirmed));
        for next in [Pending, Confirmed, Completed, Canceled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Canceled.can_transition_to(next));
        }
    }
}
