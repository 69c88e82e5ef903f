//! Room inventory snapshot types
//!
//! A room snapshot is a point-in-time copy of one hotel's room list,
//! persisted so front-desk flows keep working during an outage. Snapshots
//! are replaced wholesale by a successful fetch and carry the fetch
//! timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a hotel within a tenant. Issued by the backend; opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct HotelId(String);

impl HotelId {
    pub fn new(id: &str) -> Self {
        HotelId(id.to_string())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for HotelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HotelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for HotelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One room as reported by the backend's room listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,

    pub room_number: String,

    pub room_type: String,

    pub price_per_night: f64,

    pub capacity: u32,

    pub description: Option<String>,

    /// Backend-defined status string (e.g. AVAILABLE, OCCUPIED). Passed
    /// through untouched; the cache does not interpret it.
    pub status: String,
}

/// A persisted, point-in-time copy of a hotel's room list.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub hotel_id: HotelId,

    pub rooms: Vec<Room>,

    /// When the listing was fetched from the backend.
    pub fetched_at: DateTime<Utc>,
}

impl RoomSnapshot {
    pub fn new(hotel_id: HotelId, rooms: Vec<Room>) -> Self {
        RoomSnapshot {
            hotel_id,
            rooms,
            fetched_at: Utc::now(),
        }
    }

    /// Age of the snapshot relative to now.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}
