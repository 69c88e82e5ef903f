use async_trait::async_trait;
use sqlx::SqlitePool;

use concierge_core::{
    Error, SessionToken, UserProfile, error::StorageError,
    repositories::CredentialRepository,
};

/// Storage keys for the current credential schema.
const TOKEN_KEY: &str = "auth_token";
const USER_KEY: &str = "auth_user";

/// Keys used by earlier releases, migrated and cleaned up on startup.
const LEGACY_TOKEN_KEYS: &[&str] = &["token", "authToken"];

/// Credential store over a small key-value table.
///
/// Single source of truth for the bearer token and the persisted user
/// profile.
pub struct SqliteCredentialRepository {
    pool: SqlitePool,
}

impl SqliteCredentialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>, Error> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM credentials WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, key, "Failed to read credential");
                    Error::Storage(StorageError::Database(e.to_string()))
                })?;
        Ok(value)
    }

    async fn delete_key(&self, key: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM credentials WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key, "Failed to delete credential");
                Error::Storage(StorageError::Database(e.to_string()))
            })?;
        Ok(())
    }
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    async fn set_auth(&self, token: &SessionToken, user: &UserProfile) -> Result<(), Error> {
        let profile_json = serde_json::to_string(user)
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        let now = chrono::Utc::now().timestamp();

        // Token and profile land together or not at all.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        sqlx::query(
            "INSERT OR REPLACE INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(TOKEN_KEY)
        .bind(token.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to persist token");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        sqlx::query(
            "INSERT OR REPLACE INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(USER_KEY)
        .bind(&profile_json)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to persist user profile");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        tx.commit()
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn token(&self) -> Result<Option<SessionToken>, Error> {
        Ok(self.get_value(TOKEN_KEY).await?.map(SessionToken::from))
    }

    async fn user(&self) -> Result<Option<UserProfile>, Error> {
        let Some(raw) = self.get_value(USER_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                // Corrupted persisted profile: clear it rather than failing
                // every read from here on.
                tracing::warn!(error = %e, "Clearing corrupted persisted user profile");
                self.delete_key(USER_KEY).await?;
                Ok(None)
            }
        }
    }

    async fn update_user(&self, user: &UserProfile) -> Result<(), Error> {
        let profile_json = serde_json::to_string(user)
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        sqlx::query(
            "INSERT OR REPLACE INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(USER_KEY)
        .bind(&profile_json)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to update user profile");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(())
    }

    async fn clear_auth(&self) -> Result<(), Error> {
        sqlx::query(
            "DELETE FROM credentials WHERE key IN (?1, ?2, ?3, ?4)",
        )
        .bind(TOKEN_KEY)
        .bind(USER_KEY)
        .bind(LEGACY_TOKEN_KEYS[0])
        .bind(LEGACY_TOKEN_KEYS[1])
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to clear credentials");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(())
    }

    async fn migrate_legacy_tokens(&self) -> Result<(), Error> {
        // Best effort: nothing here may fail the caller.
        let current = match self.get_value(TOKEN_KEY).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping legacy token migration");
                return Ok(());
            }
        };

        for legacy_key in LEGACY_TOKEN_KEYS {
            match self.get_value(legacy_key).await {
                Ok(Some(legacy)) => {
                    if current.is_none() && !legacy.is_empty() {
                        tracing::info!(key = legacy_key, "Migrating legacy token");
                        if let Err(e) = sqlx::query(
                            "INSERT OR REPLACE INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)",
                        )
                        .bind(TOKEN_KEY)
                        .bind(&legacy)
                        .bind(chrono::Utc::now().timestamp())
                        .execute(&self.pool)
                        .await
                        {
                            tracing::warn!(error = %e, "Failed to migrate legacy token");
                            continue;
                        }
                    }
                    if let Err(e) = self.delete_key(legacy_key).await {
                        tracing::warn!(error = %e, key = legacy_key, "Failed to remove legacy token");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, key = legacy_key, "Skipping unreadable legacy token");
                }
            }
        }

        Ok(())
    }
}
