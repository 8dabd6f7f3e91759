//! Credential store: the `users` table plus argon2id password hashing.
//!
//! Registration is a single `INSERT` guarded by the `PRIMARY KEY` on
//! `username`, so two concurrent registrations of the same name cannot both
//! succeed. A duplicate is reported as [`RegisterOutcome::AlreadyExists`];
//! only storage and hashing failures are errors.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::models::User;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid hashing parameters: {0}")]
    Params(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Stored hash for user {username} is not a valid PHC string")]
    CorruptHash { username: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Authenticated,
    Rejected,
}

#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
    hasher: Argon2<'static>,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool, auth: &AuthConfig) -> Result<Self, StoreError> {
        let params = Params::new(auth.memory_kib, auth.iterations, auth.parallelism, None)
            .map_err(|e| StoreError::Params(e.to_string()))?;
        Ok(Self {
            pool,
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterOutcome, StoreError> {
        let password_hash = self.hash(password).await?;

        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                tracing::info!(username = %username, "Registered new user");
                Ok(RegisterOutcome::Registered)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(username = %username, "Registration rejected: username taken");
                Ok(RegisterOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<VerifyOutcome, StoreError> {
        let Some(user) = self.find(username).await? else {
            return Ok(VerifyOutcome::Rejected);
        };

        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let matched = tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&user.password_hash).map_err(|_| {
                StoreError::CorruptHash {
                    username: user.username.clone(),
                }
            })?;
            Ok::<_, StoreError>(hasher.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))??;

        Ok(if matched {
            VerifyOutcome::Authenticated
        } else {
            VerifyOutcome::Rejected
        })
    }

    pub async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Argon2 is CPU-bound; hash off the async workers.
    async fn hash(&self, password: &str) -> Result<String, StoreError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| StoreError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Hashing(e.to_string()))?
    }
}
