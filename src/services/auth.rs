//! Authentication service: login, logout, profile, registration and password reset

use chrono::{Duration, Utc};
use validator::Validate;

use super::{
    activity::ActivityService,
    codes::{generate_reset_token, hash_reset_token},
    email::EmailService,
    redis::RedisService,
    users::{check_new_password, hash_password, verify_password, UsersService},
};
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        activity::{actions, tables, ClientInfo},
        blank_to_none,
        enums::Role,
        user::{RegisterUser, UpdateProfile, User, UserClaims},
    },
    repository::{users::UserRecord, Repository},
};

const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    redis: RedisService,
    email: EmailService,
    activity: ActivityService,
    users: UsersService,
}

impl AuthService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        redis: RedisService,
        email: EmailService,
        activity: ActivityService,
        users: UsersService,
    ) -> Self {
        Self {
            repository,
            config,
            redis,
            email,
            activity,
            users,
        }
    }

    fn token_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            Duration::days(self.config.remember_me_days as i64)
        } else {
            Duration::hours(self.config.jwt_expiration_hours as i64)
        }
    }

    /// Authenticate by username or email and return a signed JWT with its claims
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        remember_me: bool,
        client: &ClientInfo,
    ) -> AppResult<(String, UserClaims, User)> {
        let login = login.trim();
        let user = self.repository.users.get_by_login(login).await?;

        let user = match user {
            Some(user) if user.is_active && verify_password(&user.password_hash, password)? => user,
            other => {
                tracing::warn!("Failed login attempt for '{}'", login);
                self.activity
                    .record(
                        other.as_ref().map(|u| u.id),
                        client,
                        actions::LOGIN_FAILED,
                        Some(tables::USERS),
                        other.as_ref().map(|u| u.id),
                        format!("Failed login attempt for '{}'", login),
                    )
                    .await;
                return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
            }
        };

        self.repository.users.touch_last_login(user.id).await?;

        let claims = UserClaims::new(&user, self.token_ttl(remember_me));
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!("User {} logged in", user.username);
        self.activity
            .record(
                Some(user.id),
                client,
                actions::LOGIN,
                Some(tables::USERS),
                Some(user.id),
                format!("User {} logged in", user.username),
            )
            .await;

        Ok((token, claims, user))
    }

    /// Validate a bearer token, reject revoked ones and re-check the account
    pub async fn authenticate_token(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

        if self.redis.is_token_revoked(&claims.jti).await? {
            return Err(AppError::Authentication("Token has been revoked".to_string()));
        }

        let user = self.repository.users.find_by_id(claims.user_id).await?;
        claims.refreshed(user.as_ref())
    }

    /// Revoke the presented token until its natural expiry
    pub async fn logout(&self, claims: &UserClaims, client: &ClientInfo) -> AppResult<()> {
        let remaining = (claims.exp - Utc::now().timestamp()).max(0) as u64;
        self.redis.revoke_token(&claims.jti, remaining).await?;

        self.activity
            .record(
                Some(claims.user_id),
                client,
                actions::LOGOUT,
                Some(tables::USERS),
                Some(claims.user_id),
                format!("User {} logged out", claims.sub),
            )
            .await;
        Ok(())
    }

    pub async fn me(&self, claims: &UserClaims) -> AppResult<User> {
        self.repository.users.get_by_id(claims.user_id).await
    }

    /// Update own profile; changing the password requires the current one
    pub async fn update_profile(&self, claims: &UserClaims, data: UpdateProfile, client: &ClientInfo) -> AppResult<User> {
        data.validate()?;
        let current = self.repository.users.get_by_id(claims.user_id).await?;

        let password_hash = match data.new_password.as_deref().filter(|p| !p.is_empty()) {
            Some(new_password) => {
                let current_password = data.current_password.as_deref().unwrap_or_default();
                if !verify_password(&current.password_hash, current_password)? {
                    return Err(AppError::Validation("Current password is incorrect".to_string()));
                }
                check_new_password(
                    new_password,
                    data.confirm_password.as_deref().unwrap_or_default(),
                    self.config.min_password_length,
                )?;
                Some(hash_password(new_password)?)
            }
            None => None,
        };

        let record = UserRecord {
            username: current.username.clone(),
            email: data.email.map(|e| e.trim().to_string()).unwrap_or(current.email),
            full_name: data
                .full_name
                .map(|n| n.trim().to_string())
                .unwrap_or(current.full_name),
            phone: match data.phone {
                Some(phone) => blank_to_none(Some(phone)),
                None => current.phone,
            },
            role: current.role,
            is_active: current.is_active,
        };
        self.users
            .ensure_unique(&record.username, &record.email, Some(current.id))
            .await?;

        let user = self
            .repository
            .users
            .update(current.id, &record, password_hash.as_deref())
            .await?;

        let description = if password_hash.is_some() {
            "Updated profile and password"
        } else {
            "Updated profile"
        };
        self.activity
            .record(
                Some(user.id),
                client,
                actions::UPDATE_PROFILE,
                Some(tables::USERS),
                Some(user.id),
                description,
            )
            .await;

        Ok(user)
    }

    /// Public self-registration; new accounts are active members
    pub async fn register(&self, data: RegisterUser, client: &ClientInfo) -> AppResult<User> {
        if !self.config.allow_registration {
            return Err(AppError::Authorization("Self-registration is disabled".to_string()));
        }
        data.validate()?;
        check_new_password(&data.password, &data.confirm_password, self.config.min_password_length)?;

        let record = UserRecord {
            username: data.username.trim().to_string(),
            email: data.email.trim().to_string(),
            full_name: data.full_name.trim().to_string(),
            phone: blank_to_none(data.phone),
            role: Role::Member,
            is_active: true,
        };
        self.users.ensure_unique(&record.username, &record.email, None).await?;

        let password_hash = hash_password(&data.password)?;
        let user = self.repository.users.create(&record, &password_hash).await?;

        tracing::info!("User {} registered", user.username);
        self.activity
            .record(
                Some(user.id),
                client,
                actions::REGISTER,
                Some(tables::USERS),
                Some(user.id),
                format!("User {} registered", user.username),
            )
            .await;

        Ok(user)
    }

    /// Email a one-time reset link when an active account uses this address.
    ///
    /// Never reveals whether the address is known: every failure is logged only.
    pub async fn request_password_reset(&self, email: &str, client: &ClientInfo) {
        if let Err(e) = self.send_reset_link(email.trim(), client).await {
            tracing::warn!("Password reset request could not be completed: {}", e);
        }
    }

    async fn send_reset_link(&self, email: &str, client: &ClientInfo) -> AppResult<()> {
        let user = match self.repository.users.get_by_email(email).await? {
            Some(user) if user.is_active => user,
            _ => {
                tracing::debug!("Password reset requested for unknown address");
                return Ok(());
            }
        };

        let token = generate_reset_token(&mut rand::thread_rng());
        self.redis
            .store_reset_token(&hash_reset_token(&token), user.id, self.config.password_reset_ttl_secs)
            .await?;

        self.activity
            .record(
                Some(user.id),
                client,
                actions::PASSWORD_RESET_REQUEST,
                Some(tables::USERS),
                Some(user.id),
                format!("Password reset requested for {}", user.username),
            )
            .await;

        self.email
            .send_password_reset(
                &user.email,
                &user.full_name,
                &token,
                self.config.password_reset_ttl_secs / 60,
            )
            .await
    }

    /// Set a new password with a reset token (single use)
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        confirmation: &str,
        client: &ClientInfo,
    ) -> AppResult<()> {
        check_new_password(new_password, confirmation, self.config.min_password_length)?;

        let user_id = self
            .redis
            .take_reset_token(&hash_reset_token(token.trim()))
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let user = self.repository.users.get_by_id(user_id).await?;
        if !user.is_active {
            return Err(AppError::BadRequest("Invalid or expired reset token".to_string()));
        }

        let password_hash = hash_password(new_password)?;
        self.repository.users.set_password(user.id, &password_hash).await?;

        tracing::info!("Password reset for user {}", user.username);
        self.activity
            .record(
                Some(user.id),
                client,
                actions::PASSWORD_RESET,
                Some(tables::USERS),
                Some(user.id),
                format!("Password reset for {}", user.username),
            )
            .await;

        Ok(())
    }

    /// Create the configured admin account when the database has no admin yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        if self.repository.users.admin_exists().await? {
            return Ok(());
        }

        let (username, email, password) = match (
            &self.config.bootstrap_admin_username,
            &self.config.bootstrap_admin_email,
            &self.config.bootstrap_admin_password,
        ) {
            (Some(username), Some(email), Some(password)) => (username, email, password),
            _ => {
                tracing::warn!("No admin account exists and no bootstrap admin is configured");
                return Ok(());
            }
        };

        let record = UserRecord {
            username: username.clone(),
            email: email.clone(),
            full_name: "Administrator".to_string(),
            phone: None,
            role: Role::Admin,
            is_active: true,
        };
        let password_hash = hash_password(password)?;
        let user = self.repository.users.create(&record, &password_hash).await?;

        tracing::warn!(
            "Created bootstrap admin account '{}'; change its password",
            user.username
        );
        Ok(())
    }
}
