use async_trait::async_trait;

use crate::{Error, staff::StaffSessionRecord};

/// Persistence for staff session records, the basis of offline login.
///
/// Writes are last-writer-wins per email: this is a single-user, single-
/// device cache, not a multi-writer store.
#[async_trait]
pub trait StaffSessionRepository: Send + Sync + 'static {
    /// Insert the record, replacing any existing records for the same email
    /// or user in the same write.
    async fn upsert(&self, record: &StaffSessionRecord) -> Result<(), Error>;

    /// The most recent record for the email by `last_activity`, regardless
    /// of `is_active`; a logged-out account must be able to log back in
    /// offline.
    async fn find_for_offline_auth(&self, email: &str)
    -> Result<Option<StaffSessionRecord>, Error>;

    /// The active record, if one exists.
    async fn find_active(&self) -> Result<Option<StaffSessionRecord>, Error>;

    /// Flip `is_active` off on every record. Records are retained, not
    /// deleted, so offline login keeps working after logout.
    async fn deactivate_all(&self) -> Result<(), Error>;

    /// Remove records whose `expires_at` has passed.
    async fn delete_expired(&self) -> Result<(), Error>;
}
