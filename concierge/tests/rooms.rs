//! Room snapshot cache: cached vs forced reads, background refresh
//! lifecycle, and failure behavior.

mod common;

use std::time::Duration;

use common::{
    FRONTDESK_EMAIL, FRONTDESK_PASSWORD, frontdesk_response_without_hotel, setup, wait_until,
};

use concierge::ConciergeConfig;
use concierge_core::HotelId;

#[tokio::test]
async fn test_cached_vs_forced_fetch() {
    let (concierge, _repositories, backend) = setup(ConciergeConfig::default()).await;

    // A desk account without a hotel binding: no background refresh task,
    // so every network call below is accounted for.
    backend.add_user("nohotel@grandhotel.test", "p@ss", frontdesk_response_without_hotel());
    concierge.login("nohotel@grandhotel.test", "p@ss").await.unwrap();
    assert_eq!(backend.room_call_count(), 0);

    let hotel = HotelId::new("5");

    // No snapshot yet: a non-forced read fetches.
    let rooms = concierge.rooms(&hotel, false).await.unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(backend.room_call_count(), 1);

    // Snapshot present: served from the cache, no network call.
    let rooms = concierge.rooms(&hotel, false).await.unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(backend.room_call_count(), 1);

    // Forced: always a network call.
    concierge.rooms(&hotel, true).await.unwrap();
    assert_eq!(backend.room_call_count(), 2);
}

#[tokio::test]
async fn test_fetch_failure_leaves_snapshot_untouched() {
    let (concierge, _repositories, backend) = setup(ConciergeConfig::default()).await;

    backend.add_user("nohotel@grandhotel.test", "p@ss", frontdesk_response_without_hotel());
    concierge.login("nohotel@grandhotel.test", "p@ss").await.unwrap();

    let hotel = HotelId::new("5");
    concierge.rooms(&hotel, false).await.unwrap();

    backend.set_online(false);

    // A forced refresh fails while offline...
    assert!(concierge.rooms(&hotel, true).await.is_err());

    // ...but the cached snapshot still serves non-forced reads.
    let rooms = concierge.rooms(&hotel, false).await.unwrap();
    assert_eq!(rooms.len(), 2);
}

#[tokio::test]
async fn test_login_fills_room_cache_in_background() {
    let (concierge, repositories, backend) = setup(
        ConciergeConfig::default().with_room_refresh_interval(Duration::from_secs(3600)),
    )
    .await;

    concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();

    // The fill is fire-and-forget relative to login; wait for it to land.
    assert!(
        wait_until(|| backend.room_call_count() >= 1, Duration::from_secs(2)).await,
        "background room fill never ran"
    );

    // The snapshot write follows the counted fetch; let it settle.
    tokio::time::sleep(Duration::from_millis(100)).await;

    use concierge_core::repositories::{RoomSnapshotRepository, RoomSnapshotRepositoryProvider};
    let snapshot = repositories
        .room_snapshots()
        .find_by_hotel(&HotelId::new("5"))
        .await
        .unwrap();
    assert!(snapshot.is_some());
}

#[tokio::test]
async fn test_periodic_refresh_stops_on_logout() {
    let (concierge, _repositories, backend) = setup(
        ConciergeConfig::default().with_room_refresh_interval(Duration::from_millis(50)),
    )
    .await;

    concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();

    // Initial fill plus at least one periodic refresh.
    assert!(
        wait_until(|| backend.room_call_count() >= 2, Duration::from_secs(2)).await,
        "periodic refresh never fired"
    );

    concierge.logout().await;

    // Give a possible in-flight refresh time to finish, then demand silence
    // for several intervals.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let after_logout = backend.room_call_count();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        backend.room_call_count(),
        after_logout,
        "refresh kept running after logout"
    );
}

#[tokio::test]
async fn test_refresh_failures_do_not_disturb_cached_data() {
    let (concierge, _repositories, backend) = setup(
        ConciergeConfig::default().with_room_refresh_interval(Duration::from_millis(50)),
    )
    .await;

    concierge
        .login(FRONTDESK_EMAIL, FRONTDESK_PASSWORD)
        .await
        .unwrap();

    assert!(
        wait_until(|| backend.room_call_count() >= 1, Duration::from_secs(2)).await,
        "background room fill never ran"
    );
    // Let the snapshot write settle before cutting the network.
    tokio::time::sleep(Duration::from_millis(100)).await;

    backend.set_online(false);

    // Periodic refreshes now fail silently; cached reads keep working.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let rooms = concierge.rooms(&HotelId::new("5"), false).await.unwrap();
    assert_eq!(rooms.len(), 2);
    assert!(concierge.is_authenticated().await);
}
