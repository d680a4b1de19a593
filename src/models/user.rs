//! User model, request payloads and JWT claims

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::Role;
use crate::error::AppError;

/// Full user model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short user representation embedded in loans and returns
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub username: String,
    pub full_name: String,
}

/// User list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Search in username, email and full name
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
    /// Defaults to member
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: String,
    pub confirm_password: String,
}

/// Update user request (admin)
///
/// Password fields are optional; when `password` is present it must match
/// `confirm_password`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Update own profile request (for authenticated users)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: Option<String>,
    /// Email address (must be unique)
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Current password (required to change password)
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Public self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Role with a human readable description
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleInfo {
    pub role: Role,
    pub description: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    /// Token id, used to revoke the token on logout
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and validate a JWT token (signature and expiry)
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Require admin or librarian privileges
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }

    /// Staff may act on anyone; members only on themselves
    pub fn require_self_or_staff(&self, user_id: i32) -> Result<(), AppError> {
        if self.is_staff() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization("Access to other users' records is not allowed".to_string()))
        }
    }

    /// Re-check the token against the current account row.
    /// Missing or deactivated accounts are rejected; role and username come from the row.
    pub fn refreshed(mut self, user: Option<&User>) -> Result<Self, AppError> {
        match user {
            Some(user) if user.is_active => {
                self.role = user.role;
                self.sub = user.username.clone();
                Ok(self)
            }
            _ => Err(AppError::Authentication("Account is no longer active".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: 7,
            username: "siti".to_string(),
            email: "siti@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$xxxx$yyyy".to_string(),
            full_name: "Siti Rahayu".to_string(),
            phone: None,
            role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_roundtrip_keeps_identity() {
        let claims = UserClaims::new(&user(Role::Librarian), Duration::hours(1));
        let token = claims.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.role, Role::Librarian);
        assert_eq!(decoded.jti, claims.jti);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = UserClaims::new(&user(Role::Admin), Duration::hours(1))
            .create_token("secret")
            .unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = UserClaims::new(&user(Role::Admin), Duration::hours(-2))
            .create_token("secret")
            .unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_each_token_has_its_own_id() {
        let u = user(Role::Member);
        let a = UserClaims::new(&u, Duration::hours(1));
        let b = UserClaims::new(&u, Duration::hours(1));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_role_checks() {
        let admin = UserClaims::new(&user(Role::Admin), Duration::hours(1));
        let librarian = UserClaims::new(&user(Role::Librarian), Duration::hours(1));
        let member = UserClaims::new(&user(Role::Member), Duration::hours(1));

        assert!(admin.require_admin().is_ok());
        assert!(librarian.require_admin().is_err());
        assert!(librarian.require_staff().is_ok());
        assert!(member.require_staff().is_err());

        assert!(member.require_self_or_staff(7).is_ok());
        assert!(member.require_self_or_staff(8).is_err());
        assert!(librarian.require_self_or_staff(8).is_ok());
    }

    #[test]
    fn test_refreshed_claims_follow_the_account() {
        let claims = UserClaims::new(&user(Role::Admin), Duration::hours(1));

        let mut demoted = user(Role::Member);
        demoted.username = "siti.r".to_string();
        let refreshed = claims.clone().refreshed(Some(&demoted)).unwrap();
        assert_eq!(refreshed.role, Role::Member);
        assert_eq!(refreshed.sub, "siti.r");
        assert!(refreshed.require_staff().is_err());

        let mut inactive = user(Role::Admin);
        inactive.is_active = false;
        assert!(matches!(
            claims.clone().refreshed(Some(&inactive)),
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(claims.refreshed(None), Err(AppError::Authentication(_))));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(Role::Member)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "member");
    }
}
