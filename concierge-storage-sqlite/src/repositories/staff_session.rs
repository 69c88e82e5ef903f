use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use concierge_core::{
    Error, HotelId, RoleSet, SessionToken, StaffSessionRecord, TenantId, UserId,
    error::StorageError, repositories::StaffSessionRepository,
};

pub struct SqliteStaffSessionRepository {
    pool: SqlitePool,
}

impl SqliteStaffSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteStaffSession {
    id: String,
    user_id: String,
    username: String,
    email: String,
    roles: String,
    hotel_id: Option<String>,
    hotel_name: Option<String>,
    tenant_id: Option<String>,
    token: String,
    password_verifier: Option<String>,
    expires_at: i64,
    last_activity: i64,
    is_active: bool,
}

impl TryFrom<SqliteStaffSession> for StaffSessionRecord {
    type Error = Error;

    fn try_from(row: SqliteStaffSession) -> Result<Self, Error> {
        let roles: Vec<String> = serde_json::from_str(&row.roles)
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        StaffSessionRecord::builder()
            .id(row.id)
            .user_id(UserId::new(&row.user_id))
            .username(row.username)
            .email(row.email)
            .roles(RoleSet::new(roles))
            .hotel_id(row.hotel_id.map(HotelId::from))
            .hotel_name(row.hotel_name)
            .tenant_id(row.tenant_id.map(TenantId::new_unchecked))
            .token(SessionToken::from(row.token))
            .password_verifier(row.password_verifier)
            .expires_at(timestamp(row.expires_at)?)
            .last_activity(timestamp(row.last_activity)?)
            .is_active(row.is_active)
            .build()
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        Error::Storage(StorageError::Database(format!(
            "invalid timestamp {secs}"
        )))
    })
}

#[async_trait]
impl StaffSessionRepository for SqliteStaffSessionRepository {
    async fn upsert(&self, record: &StaffSessionRecord) -> Result<(), Error> {
        let roles = serde_json::to_string(record.roles.as_slice())
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        // Last-writer-wins per email: drop any earlier record for this
        // account before inserting the fresh one.
        sqlx::query("DELETE FROM staff_sessions WHERE email = ?1 OR user_id = ?2")
            .bind(&record.email)
            .bind(record.user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to replace staff session");
                Error::Storage(StorageError::Database(e.to_string()))
            })?;

        sqlx::query(
            r#"
            INSERT INTO staff_sessions
                (id, user_id, username, email, roles, hotel_id, hotel_name, tenant_id,
                 token, password_verifier, expires_at, last_activity, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id.as_str())
        .bind(&record.username)
        .bind(&record.email)
        .bind(&roles)
        .bind(record.hotel_id.as_ref().map(HotelId::as_str))
        .bind(&record.hotel_name)
        .bind(record.tenant_id.as_ref().map(TenantId::as_str))
        .bind(record.token.as_str())
        .bind(&record.password_verifier)
        .bind(record.expires_at.timestamp())
        .bind(record.last_activity.timestamp())
        .bind(record.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to save staff session");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        tx.commit()
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn find_for_offline_auth(
        &self,
        email: &str,
    ) -> Result<Option<StaffSessionRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteStaffSession>(
            r#"
            SELECT id, user_id, username, email, roles, hotel_id, hotel_name, tenant_id,
                   token, password_verifier, expires_at, last_activity, is_active
            FROM staff_sessions
            WHERE email = ?1
            ORDER BY last_activity DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up staff session");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        row.map(StaffSessionRecord::try_from).transpose()
    }

    async fn find_active(&self) -> Result<Option<StaffSessionRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteStaffSession>(
            r#"
            SELECT id, user_id, username, email, roles, hotel_id, hotel_name, tenant_id,
                   token, password_verifier, expires_at, last_activity, is_active
            FROM staff_sessions
            WHERE is_active = 1 AND expires_at > ?1
            ORDER BY last_activity DESC
            LIMIT 1
            "#,
        )
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up active staff session");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        row.map(StaffSessionRecord::try_from).transpose()
    }

    async fn deactivate_all(&self) -> Result<(), Error> {
        sqlx::query(
            "UPDATE staff_sessions SET is_active = 0, last_activity = ?1 WHERE is_active = 1",
        )
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to deactivate staff sessions");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM staff_sessions WHERE expires_at <= ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete expired staff sessions");
                Error::Storage(StorageError::Database(e.to_string()))
            })?;

        Ok(())
    }
}
