//! Redis service for revoked tokens and password reset tokens

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service; connections are opened on first use
    pub fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    /// Test the connection
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Unavailable(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }

    /// Mark a token id as revoked until the token would have expired anyway
    pub async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = self.get_connection().await?;

        conn.set_ex::<_, _, ()>(revoked_key(jti), "1", ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store revoked token in Redis: {}", e)))?;
        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: &str) -> AppResult<bool> {
        let mut conn = self.get_connection().await?;

        let exists: bool = conn
            .exists(revoked_key(jti))
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to check revoked token in Redis: {}", e)))?;
        Ok(exists)
    }

    /// Store a password reset token hash for a user with expiration (in seconds)
    pub async fn store_reset_token(&self, token_hash: &str, user_id: i32, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.get_connection().await?;

        conn.set_ex::<_, _, ()>(reset_key(token_hash), user_id, ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store reset token in Redis: {}", e)))?;
        Ok(())
    }

    /// Consume a password reset token hash (one-time use), returning its user id
    pub async fn take_reset_token(&self, token_hash: &str) -> AppResult<Option<i32>> {
        let mut conn = self.get_connection().await?;
        let key = reset_key(token_hash);

        let user_id: Option<i32> = conn
            .get(&key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get reset token from Redis: {}", e)))?;

        if user_id.is_some() {
            let _: () = conn
                .del(&key)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to delete reset token from Redis: {}", e)))?;
        }
        Ok(user_id)
    }

    /// Get a Redis connection
    pub async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to get Redis connection: {}", e)))
    }
}

fn revoked_key(jti: &str) -> String {
    format!("revoked_jti:{}", jti)
}

fn reset_key(token_hash: &str) -> String {
    format!("password_reset:{}", token_hash)
}
