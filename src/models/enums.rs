//! Shared domain enums stored as TEXT columns

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Implements string conversions and the sqlx TEXT mapping for a fieldless enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Librarian,
    Member,
}

text_enum!(Role {
    Admin => "admin",
    Librarian => "librarian",
    Member => "member",
});

impl Role {
    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full access including users, suppliers and the activity log",
            Role::Librarian => "Manages the catalog, loans, returns and reports",
            Role::Member => "Browses the catalog and follows own loans",
        }
    }

    /// Admins and librarians
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Borrowed,
    Returned,
    Overdue,
    Lost,
}

text_enum!(LoanStatus {
    Borrowed => "borrowed",
    Returned => "returned",
    Overdue => "overdue",
    Lost => "lost",
});

impl LoanStatus {
    /// The copy is still out (borrowed or overdue)
    pub fn is_active(&self) -> bool {
        matches!(self, LoanStatus::Borrowed | LoanStatus::Overdue)
    }
}

// ---------------------------------------------------------------------------
// ItemCondition
// ---------------------------------------------------------------------------

/// Physical condition of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    New,
    #[default]
    Good,
    MinorDamage,
    MajorDamage,
}

text_enum!(ItemCondition {
    New => "new",
    Good => "good",
    MinorDamage => "minor_damage",
    MajorDamage => "major_damage",
});

// ---------------------------------------------------------------------------
// ReturnCondition
// ---------------------------------------------------------------------------

/// Condition of a copy recorded when it comes back (or does not)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReturnCondition {
    Good,
    MinorDamage,
    MajorDamage,
    Lost,
}

text_enum!(ReturnCondition {
    Good => "good",
    MinorDamage => "minor_damage",
    MajorDamage => "major_damage",
    Lost => "lost",
});

impl ReturnCondition {
    /// Loan status a return with this condition closes the loan with
    pub fn closing_status(&self) -> LoanStatus {
        match self {
            ReturnCondition::Lost => LoanStatus::Lost,
            _ => LoanStatus::Returned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" minor_damage ".parse::<ItemCondition>().unwrap(), ItemCondition::MinorDamage);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_matches_column_text() {
        for status in LoanStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for condition in ReturnCondition::ALL {
            let json = serde_json::to_string(condition).unwrap();
            assert_eq!(json, format!("\"{}\"", condition.as_str()));
        }
    }

    #[test]
    fn test_active_statuses() {
        assert!(LoanStatus::Borrowed.is_active());
        assert!(LoanStatus::Overdue.is_active());
        assert!(!LoanStatus::Returned.is_active());
        assert!(!LoanStatus::Lost.is_active());
    }

    #[test]
    fn test_lost_return_closes_as_lost() {
        assert_eq!(ReturnCondition::Lost.closing_status(), LoanStatus::Lost);
        assert_eq!(ReturnCondition::MajorDamage.closing_status(), LoanStatus::Returned);
    }

    #[test]
    fn test_staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Librarian.is_staff());
        assert!(!Role::Member.is_staff());
    }
}
