/*
In-memory snapshot of the two related resources (devices, rental
statistics) plus the cached system status.

The store is the only component that mutates the snapshot. Mutations go
through the backend and trigger a full refresh; there is no local
optimistic merge. A refresh is all-or-nothing: when either of its two
concurrent requests fails, the previous snapshot stays fully in place.
*/

pub mod poll;

use tokio::sync::RwLock;
use tracing::{instrument, warn};

use crate::models::{Device, DeviceId, DeviceStatus, Platform, Rental, RentalStats, SystemStatus};
use crate::remote::api::Api;
use crate::remote::request::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Available,
    Rented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFilter {
    All,
    Android,
    Ios,
}

/// Which slice of the rental history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalScope {
    All,
    Active,
    Returned,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub stats: Option<RentalStats>,
    pub system_status: Option<SystemStatus>,
}

/// Device counts derived from the snapshot, not from the stats
/// endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCounts {
    pub total: usize,
    pub available: usize,
    pub rented: usize,
}

#[derive(Debug)]
struct StoreState {
    snapshot: Snapshot,
    loading: bool,
    refreshing: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            snapshot: Snapshot::default(),
            loading: true,
            refreshing: false,
        }
    }
}

pub struct Store {
    api: Api,
    state: RwLock<StoreState>,
}

impl Store {
    pub fn new(api: Api) -> Self {
        Self {
            api,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Fetch the device list and rental statistics concurrently and
    /// replace the snapshot only when both requests succeed. A single
    /// failure leaves the previous snapshot untouched; authorization
    /// failures have already been intercepted by the transport.
    #[instrument(skip_all, err)]
    pub async fn refresh(&self) -> Result<(), RequestError> {
        self.state.write().await.refreshing = true;

        let result = tokio::try_join!(self.api.list_devices(), self.api.rental_stats());

        let mut state = self.state.write().await;
        state.refreshing = false;
        // the initial loading phase ends with the first attempt,
        // successful or not
        state.loading = false;

        let (devices, stats) = result?;
        for device in &devices {
            if !device.is_consistent() {
                warn!(
                    device = %device.device_number,
                    "renter record does not match device status"
                );
            }
        }
        state.snapshot.devices = devices;
        state.snapshot.stats = Some(stats);
        Ok(())
    }

    /// Refresh the cached system status. Independent of [`refresh`];
    /// driven by the status poller while a session is active.
    pub async fn fetch_system_status(&self) -> Result<SystemStatus, RequestError> {
        let status = self.api.system_status().await?;
        self.state.write().await.snapshot.system_status = Some(status.clone());
        Ok(status)
    }

    /// Replace the cached system status with a configuration the
    /// backend echoed back from a mutation.
    pub async fn set_system_status(&self, status: SystemStatus) {
        self.state.write().await.snapshot.system_status = Some(status);
    }

    /// Fetch a slice of the rental history. History views are read on
    /// demand and not cached in the snapshot.
    pub async fn fetch_rentals(&self, scope: RentalScope) -> Result<Vec<Rental>, RequestError> {
        match scope {
            RentalScope::All => self.api.rentals().await,
            RentalScope::Active => self.api.active_rentals().await,
            RentalScope::Returned => self.api.returned_rentals().await,
        }
    }

    /// Empty every cached resource. Invoked on logout and on session
    /// expiry so that an inactive session never exposes stale data.
    pub async fn clear(&self) {
        *self.state.write().await = StoreState::default();
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.state.read().await.snapshot.devices.clone()
    }

    pub async fn device(&self, id: DeviceId) -> Option<Device> {
        self.state
            .read()
            .await
            .snapshot
            .devices
            .iter()
            .find(|device| device.id == id)
            .cloned()
    }

    pub async fn system_status(&self) -> Option<SystemStatus> {
        self.state.read().await.snapshot.system_status.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn is_refreshing(&self) -> bool {
        self.state.read().await.refreshing
    }

    pub async fn device_counts(&self) -> DeviceCounts {
        let state = self.state.read().await;
        let devices = &state.snapshot.devices;
        DeviceCounts {
            total: devices.len(),
            available: devices
                .iter()
                .filter(|device| device.status == DeviceStatus::Available)
                .count(),
            rented: devices
                .iter()
                .filter(|device| device.status == DeviceStatus::Rented)
                .count(),
        }
    }
}

/// Pure filtered view of a device list. Filters compose with AND and
/// `All` matches everything; the input is never mutated.
pub fn filtered_view(
    devices: &[Device],
    status: StatusFilter,
    platform: PlatformFilter,
) -> Vec<Device> {
    devices
        .iter()
        .filter(|device| {
            let status_match = match status {
                StatusFilter::All => true,
                StatusFilter::Available => device.status == DeviceStatus::Available,
                StatusFilter::Rented => device.status == DeviceStatus::Rented,
            };
            let platform_match = match platform {
                PlatformFilter::All => true,
                PlatformFilter::Android => device.platform == Platform::Android,
                PlatformFilter::Ios => device.platform == Platform::Ios,
            };
            status_match && platform_match
        })
        .cloned()
        .collect()
}

/// Case-insensitive rental history search on renter name or device
/// number.
pub fn search_rentals(rentals: &[Rental], query: &str) -> Vec<Rental> {
    let needle = query.to_lowercase();
    rentals
        .iter()
        .filter(|rental| {
            rental.renter_name.to_lowercase().contains(&needle)
                || rental.device.device_number.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::request::Backend;
    use crate::session::CredentialStore;
    use mockito::Server;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_store(url: &str, dir: &Path) -> Store {
        let credentials = Arc::new(CredentialStore::open(dir));
        let (backend, _interceptions) =
            Backend::new(url.parse().unwrap(), Duration::from_secs(5), credentials);
        Store::new(Api::new(backend))
    }

    fn device(id: i64, status: &str, platform: &str, renter: Option<&str>) -> Device {
        serde_json::from_value(json!({
            "id": id,
            "deviceNumber": format!("NO-{id}"),
            "productName": "Galaxy S24",
            "platform": platform,
            "osVersion": "14",
            "status": status,
            "currentRenter": renter,
        }))
        .unwrap()
    }

    fn devices_body() -> String {
        json!([
            {
                "id": 1,
                "deviceNumber": "NO-1",
                "productName": "Galaxy S24",
                "platform": "Android",
                "osVersion": "14",
                "status": "available"
            },
            {
                "id": 2,
                "deviceNumber": "NO-2",
                "productName": "iPhone 15",
                "platform": "iOS",
                "osVersion": "17.4",
                "status": "rented",
                "currentRenter": "Kim"
            }
        ])
        .to_string()
    }

    fn stats_body() -> String {
        json!({"totalRentals": 10, "activeRentals": 2, "returnedRentals": 8}).to_string()
    }

    #[tokio::test]
    async fn it_replaces_the_snapshot_when_both_requests_succeed() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        let devices_mock = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(devices_body())
            .create_async()
            .await;
        let stats_mock = server
            .mock("GET", "/rentals/stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(stats_body())
            .create_async()
            .await;

        assert!(store.is_loading().await);
        store.refresh().await.unwrap();
        assert!(!store.is_loading().await);
        assert!(!store.is_refreshing().await);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.devices.len(), 2);
        assert_eq!(snapshot.stats.unwrap().active_rentals, 2);
        assert_eq!(
            store.device_counts().await,
            DeviceCounts {
                total: 2,
                available: 1,
                rented: 1
            }
        );

        devices_mock.assert_async().await;
        stats_mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_keeps_the_previous_snapshot_when_one_request_fails() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        // first refresh succeeds and seeds the snapshot
        let devices_ok = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(devices_body())
            .create_async()
            .await;
        let stats_ok = server
            .mock("GET", "/rentals/stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(stats_body())
            .create_async()
            .await;
        store.refresh().await.unwrap();
        devices_ok.assert_async().await;
        stats_ok.assert_async().await;

        // second refresh: devices succeed, stats fail
        let _devices_again = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let stats_err = server
            .mock("GET", "/rentals/stats")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = store.refresh().await;
        assert!(result.is_err());

        // all-or-nothing: neither cache was updated
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.devices.len(), 2);
        assert_eq!(snapshot.stats.unwrap().total_rentals, 10);
        assert!(!store.is_refreshing().await);

        stats_err.assert_async().await;
    }

    #[tokio::test]
    async fn it_caches_the_system_status_independently() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        let mock = server
            .mock("GET", "/system-status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isTestMode": true, "testMessage": "compat test"}"#)
            .create_async()
            .await;

        let status = store.fetch_system_status().await.unwrap();
        assert!(status.is_test_mode);
        assert_eq!(
            store.system_status().await.unwrap().test_message.as_deref(),
            Some("compat test")
        );

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_clears_every_cached_resource() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        let _devices = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(devices_body())
            .create_async()
            .await;
        let _stats = server
            .mock("GET", "/rentals/stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(stats_body())
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/system-status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isTestMode": false}"#)
            .create_async()
            .await;

        store.refresh().await.unwrap();
        store.fetch_system_status().await.unwrap();

        store.clear().await;

        let snapshot = store.snapshot().await;
        assert!(snapshot.devices.is_empty());
        assert!(snapshot.stats.is_none());
        assert!(snapshot.system_status.is_none());
        assert!(store.is_loading().await);
    }

    #[test]
    fn filtered_view_is_the_identity_for_all_all() {
        let devices = vec![
            device(1, "available", "Android", None),
            device(2, "rented", "iOS", Some("Kim")),
        ];

        let view = filtered_view(&devices, StatusFilter::All, PlatformFilter::All);
        assert_eq!(view.len(), devices.len());
        assert_eq!(view[0].id, 1);
        assert_eq!(view[1].id, 2);
    }

    #[test]
    fn filtered_view_composes_filters_with_and() {
        let devices = vec![
            device(1, "available", "Android", None),
            device(2, "available", "iOS", None),
            device(3, "rented", "Android", Some("Kim")),
        ];

        let view = filtered_view(&devices, StatusFilter::Available, PlatformFilter::Android);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 1);
    }

    #[test]
    fn filtered_view_is_idempotent() {
        let devices = vec![
            device(1, "available", "Android", None),
            device(2, "rented", "iOS", Some("Kim")),
            device(3, "rented", "Android", Some("Lee")),
        ];

        let once = filtered_view(&devices, StatusFilter::Rented, PlatformFilter::All);
        let twice = filtered_view(&once, StatusFilter::Rented, PlatformFilter::All);

        assert_eq!(once.len(), twice.len());
        assert!(once.iter().zip(&twice).all(|(a, b)| a.id == b.id));
        // and the input was left alone
        assert_eq!(devices.len(), 3);
    }

    #[test]
    fn search_rentals_matches_renter_or_device_number() {
        let rentals: Vec<Rental> = serde_json::from_value(json!([
            {
                "id": 1,
                "renterName": "Kim",
                "device": {"id": 1, "deviceNumber": "NO-1", "platform": "Android"},
                "rentedAt": "2025-06-01T09:00:00Z",
                "status": "active"
            },
            {
                "id": 2,
                "renterName": "Lee",
                "device": {"id": 2, "deviceNumber": "NO-2", "platform": "iOS"},
                "rentedAt": "2025-06-01T10:00:00Z",
                "status": "active"
            }
        ]))
        .unwrap();

        assert_eq!(search_rentals(&rentals, "kim").len(), 1);
        assert_eq!(search_rentals(&rentals, "no-2").len(), 1);
        assert_eq!(search_rentals(&rentals, "no-").len(), 2);
        assert!(search_rentals(&rentals, "park").is_empty());
    }
}
