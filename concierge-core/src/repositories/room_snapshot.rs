use async_trait::async_trait;

use crate::{
    Error,
    room::{HotelId, RoomSnapshot},
};

/// Persistence for per-hotel room snapshots.
#[async_trait]
pub trait RoomSnapshotRepository: Send + Sync + 'static {
    /// Replace the stored snapshot for the snapshot's hotel in one atomic
    /// write. On failure the previous snapshot must remain intact.
    async fn replace(&self, snapshot: &RoomSnapshot) -> Result<(), Error>;

    /// The stored snapshot for a hotel, if any.
    async fn find_by_hotel(&self, hotel_id: &HotelId) -> Result<Option<RoomSnapshot>, Error>;
}
