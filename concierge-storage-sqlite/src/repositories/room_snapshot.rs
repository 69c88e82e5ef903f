use async_trait::async_trait;
use sqlx::SqlitePool;

use concierge_core::{
    Error, HotelId, Room, RoomSnapshot, error::StorageError,
    repositories::RoomSnapshotRepository,
};

pub struct SqliteRoomSnapshotRepository {
    pool: SqlitePool,
}

impl SqliteRoomSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteRoom {
    room_id: String,
    room_number: String,
    room_type: String,
    price_per_night: f64,
    capacity: i64,
    description: Option<String>,
    status: String,
    fetched_at: i64,
}

impl From<SqliteRoom> for Room {
    fn from(row: SqliteRoom) -> Self {
        Room {
            id: row.room_id,
            room_number: row.room_number,
            room_type: row.room_type,
            price_per_night: row.price_per_night,
            capacity: row.capacity.max(0) as u32,
            description: row.description,
            status: row.status,
        }
    }
}

#[async_trait]
impl RoomSnapshotRepository for SqliteRoomSnapshotRepository {
    async fn replace(&self, snapshot: &RoomSnapshot) -> Result<(), Error> {
        // Delete-and-insert in one transaction: a failed replace rolls back
        // and the previous snapshot stays intact.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        sqlx::query("DELETE FROM room_snapshots WHERE hotel_id = ?1")
            .bind(snapshot.hotel_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to clear room snapshot");
                Error::Storage(StorageError::Database(e.to_string()))
            })?;

        let fetched_at = snapshot.fetched_at.timestamp();
        for room in &snapshot.rooms {
            sqlx::query(
                r#"
                INSERT INTO room_snapshots
                    (hotel_id, room_id, room_number, room_type, price_per_night,
                     capacity, description, status, fetched_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(snapshot.hotel_id.as_str())
            .bind(&room.id)
            .bind(&room.room_number)
            .bind(&room.room_type)
            .bind(room.price_per_night)
            .bind(room.capacity as i64)
            .bind(&room.description)
            .bind(&room.status)
            .bind(fetched_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to save room snapshot");
                Error::Storage(StorageError::Database(e.to_string()))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn find_by_hotel(&self, hotel_id: &HotelId) -> Result<Option<RoomSnapshot>, Error> {
        let rows = sqlx::query_as::<_, SqliteRoom>(
            r#"
            SELECT room_id, room_number, room_type, price_per_night,
                   capacity, description, status, fetched_at
            FROM room_snapshots
            WHERE hotel_id = ?1
            ORDER BY room_number
            "#,
        )
        .bind(hotel_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read room snapshot");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let fetched_at = chrono::DateTime::from_timestamp(first.fetched_at, 0)
            .ok_or_else(|| {
                Error::Storage(StorageError::Database(format!(
                    "invalid timestamp {}",
                    first.fetched_at
                )))
            })?;

        Ok(Some(RoomSnapshot {
            hotel_id: hotel_id.clone(),
            rooms: rows.into_iter().map(Room::from).collect(),
            fetched_at,
        }))
    }
}
