//! Room snapshot cache service
//!
//! Keeps one persisted room snapshot per hotel and owns the periodic
//! background refresh task. The task is tied to the session lifecycle
//! through explicit start/stop calls and a watch-channel stop signal: a
//! refresh already in flight when the task is stopped may finish, but it
//! never reschedules itself afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use concierge_core::{
    BackendConnector, Error, HotelId, Room, RoomSnapshot, SessionToken, TenantId,
    repositories::{RepositoryProvider, RoomSnapshotRepository, RoomSnapshotRepositoryProvider},
};

/// Everything a room fetch needs from the active session.
#[derive(Debug, Clone)]
pub struct RoomFetchContext {
    pub token: SessionToken,
    pub tenant_id: Option<TenantId>,
    pub hotel_id: HotelId,
}

struct RefreshTask {
    stop: watch::Sender<bool>,
    // The task exits via the stop signal, not via abort; the handle is kept
    // so a replaced task stays owned until it finishes.
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

struct RoomCacheInner<R, B> {
    repositories: Arc<R>,
    backend: Arc<B>,
    refresh: Mutex<Option<RefreshTask>>,
}

pub struct RoomCache<R, B> {
    inner: Arc<RoomCacheInner<R, B>>,
}

impl<R, B> Clone for RoomCache<R, B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R, B> RoomCache<R, B>
where
    R: RepositoryProvider,
    B: BackendConnector,
{
    pub fn new(repositories: Arc<R>, backend: Arc<B>) -> Self {
        Self {
            inner: Arc::new(RoomCacheInner {
                repositories,
                backend,
                refresh: Mutex::new(None),
            }),
        }
    }

    /// Fetch the hotel's rooms from the backend and replace the persisted
    /// snapshot. On any failure the existing snapshot is left untouched.
    pub async fn fetch_and_cache(&self, context: &RoomFetchContext) -> Result<Vec<Room>, Error> {
        let rooms = self
            .inner
            .backend
            .fetch_rooms(
                &context.token,
                context.tenant_id.as_ref(),
                &context.hotel_id,
            )
            .await?;

        let snapshot = RoomSnapshot::new(context.hotel_id.clone(), rooms.clone());
        self.inner
            .repositories
            .room_snapshots()
            .replace(&snapshot)
            .await?;

        tracing::debug!(
            hotel_id = %context.hotel_id,
            rooms = rooms.len(),
            "Room snapshot refreshed"
        );

        Ok(rooms)
    }

    /// Cached rooms for the hotel, fetching only when forced or when no
    /// snapshot exists yet.
    pub async fn rooms(
        &self,
        context: &RoomFetchContext,
        force_refresh: bool,
    ) -> Result<Vec<Room>, Error> {
        if !force_refresh {
            if let Some(snapshot) = self
                .inner
                .repositories
                .room_snapshots()
                .find_by_hotel(&context.hotel_id)
                .await?
            {
                return Ok(snapshot.rooms);
            }
        }

        self.fetch_and_cache(context).await
    }

    /// Start the background refresh for a hotel: one immediate fill, then a
    /// recurring refresh at `interval`. Replaces any task already running.
    /// Failures inside the loop are logged and never disturb the cached
    /// data.
    pub async fn start_periodic_refresh(&self, context: RoomFetchContext, interval: Duration) {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let cache = self.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = cache.fetch_and_cache(&context).await {
                tracing::warn!(error = %e, hotel_id = %context.hotel_id, "Initial room cache fill failed");
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial fill above
            // already covered it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                        if let Err(e) = cache.fetch_and_cache(&context).await {
                            tracing::warn!(error = %e, hotel_id = %context.hotel_id, "Periodic room refresh failed");
                        }
                        // Stopped mid-refresh: the fetch was allowed to
                        // finish, but never reschedule.
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!(hotel_id = %context.hotel_id, "Periodic room refresh stopped");
        });

        let mut refresh = self.inner.refresh.lock().await;
        if let Some(previous) = refresh.take() {
            let _ = previous.stop.send(true);
        }
        *refresh = Some(RefreshTask {
            stop: stop_tx,
            handle,
        });
    }

    /// Cancel the periodic refresh. Idempotent; must be called on logout so
    /// no timer leaks across sessions.
    pub async fn stop_periodic_refresh(&self) {
        if let Some(task) = self.inner.refresh.lock().await.take() {
            let _ = task.stop.send(true);
        }
    }
}
