//! User management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use super::activity::ActivityService;
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        activity::{actions, tables, ClientInfo},
        blank_to_none,
        enums::Role,
        pagination::Pagination,
        user::{CreateUser, RoleInfo, UpdateUser, User, UserClaims, UserQuery},
    },
    repository::{users::UserRecord, Repository},
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// New password must be long enough and typed twice identically
pub fn check_new_password(password: &str, confirmation: &str, min_length: u64) -> AppResult<()> {
    if (password.chars().count() as u64) < min_length {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            min_length
        )));
    }
    if password != confirmation {
        return Err(AppError::Validation(
            "Password confirmation does not match".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    activity: ActivityService,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, activity: ActivityService) -> Self {
        Self { repository, config, activity }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn search_users(&self, query: &UserQuery, pagination: Pagination) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query, pagination).await
    }

    pub fn roles(&self) -> Vec<RoleInfo> {
        Role::ALL
            .iter()
            .map(|role| RoleInfo {
                role: *role,
                description: role.description().to_string(),
            })
            .collect()
    }

    /// Fail with 409 when the username or email belongs to another account
    pub(crate) async fn ensure_unique(&self, username: &str, email: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if self.repository.users.username_exists(username, exclude_id).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if self.repository.users.email_exists(email, exclude_id).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        Ok(())
    }

    /// Create a new user
    pub async fn create_user(&self, data: CreateUser, actor: &UserClaims, client: &ClientInfo) -> AppResult<User> {
        data.validate()?;
        check_new_password(&data.password, &data.confirm_password, self.config.min_password_length)?;

        let record = UserRecord {
            username: data.username.trim().to_string(),
            email: data.email.trim().to_string(),
            full_name: data.full_name.trim().to_string(),
            phone: blank_to_none(data.phone),
            role: data.role.unwrap_or(Role::Member),
            is_active: data.is_active.unwrap_or(true),
        };
        self.ensure_unique(&record.username, &record.email, None).await?;

        let password_hash = hash_password(&data.password)?;
        let user = self.repository.users.create(&record, &password_hash).await?;

        tracing::info!("User {} created with role {}", user.username, user.role);
        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::CREATE,
                Some(tables::USERS),
                Some(user.id),
                format!("Created user {}", user.username),
            )
            .await;

        Ok(user)
    }

    /// Update an existing user
    pub async fn update_user(&self, id: i32, data: UpdateUser, actor: &UserClaims, client: &ClientInfo) -> AppResult<User> {
        data.validate()?;
        let current = self.repository.users.get_by_id(id).await?;

        if actor.user_id == id {
            if data.role.is_some_and(|role| role != current.role) {
                return Err(AppError::BusinessRule("You cannot change your own role".to_string()));
            }
            if data.is_active == Some(false) {
                return Err(AppError::BusinessRule(
                    "You cannot deactivate your own account".to_string(),
                ));
            }
        }

        let password_hash = match data.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                check_new_password(
                    password,
                    data.confirm_password.as_deref().unwrap_or_default(),
                    self.config.min_password_length,
                )?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let record = UserRecord {
            username: data
                .username
                .map(|u| u.trim().to_string())
                .unwrap_or(current.username),
            email: data.email.map(|e| e.trim().to_string()).unwrap_or(current.email),
            full_name: data
                .full_name
                .map(|n| n.trim().to_string())
                .unwrap_or(current.full_name),
            phone: match data.phone {
                Some(phone) => blank_to_none(Some(phone)),
                None => current.phone,
            },
            role: data.role.unwrap_or(current.role),
            is_active: data.is_active.unwrap_or(current.is_active),
        };
        self.ensure_unique(&record.username, &record.email, Some(id)).await?;

        let user = self
            .repository
            .users
            .update(id, &record, password_hash.as_deref())
            .await?;

        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::UPDATE,
                Some(tables::USERS),
                Some(id),
                format!("Updated user {}", user.username),
            )
            .await;

        Ok(user)
    }

    /// Delete a user that never borrowed anything
    pub async fn delete_user(&self, id: i32, actor: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        if actor.user_id == id {
            return Err(AppError::BusinessRule("You cannot delete your own account".to_string()));
        }

        let user = self.repository.users.get_by_id(id).await?;
        if user.role == Role::Admin {
            return Err(AppError::BusinessRule("Administrator accounts cannot be deleted".to_string()));
        }
        if self.repository.users.has_loans(id).await? {
            return Err(AppError::Conflict(
                "User has loan history; deactivate the account instead".to_string(),
            ));
        }

        self.repository.users.delete(id).await?;

        tracing::info!("User {} deleted", user.username);
        self.activity
            .record(
                Some(actor.user_id),
                client,
                actions::DELETE,
                Some(tables::USERS),
                Some(id),
                format!("Deleted user {}", user.username),
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "rahasia123").unwrap());
        assert!(!verify_password(&hash, "rahasia124").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("not-a-hash", "x").is_err());
    }

    #[test]
    fn test_check_new_password() {
        assert!(check_new_password("secret", "secret", 6).is_ok());
        assert!(matches!(
            check_new_password("short", "short", 6),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            check_new_password("secret1", "secret2", 6),
            Err(AppError::Validation(_))
        ));
    }
}
