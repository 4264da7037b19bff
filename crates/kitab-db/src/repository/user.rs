//! # User Repository
//!
//! Admin console accounts and their argon2 password hashes.

use chrono::Utc;
use kitab_core::AdminUser;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

/// Repository for admin accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Case-insensitive lookup by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<AdminUser>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1 COLLATE NOCASE",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates an account, or resets the password of an existing one.
    pub async fn upsert(&self, username: &str, password: &str) -> DbResult<AdminUser> {
        let password_hash = hash_password(password)?;

        let user = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (username) DO UPDATE SET password_hash = excluded.password_hash
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username.trim())
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id = user.id, username = %user.username, "Admin account saved");
        Ok(user)
    }

    /// Returns the account when the password matches.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<AdminUser>> {
        let Some(user) = self.find_by_username(username).await? else {
            warn!(username, "Login for unknown account");
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(username, "Login with wrong password");
            Ok(None)
        }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
