use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub type DeviceId = i64;
pub type RentalId = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    #[serde(rename = "iOS")]
    Ios,
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Android => f.write_str("Android"),
            Platform::Ios => f.write_str("iOS"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Available,
    Rented,
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Available => f.write_str("available"),
            DeviceStatus::Rented => f.write_str("rented"),
        }
    }
}

/// A physical test device in the pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,

    /// Display label, unique by convention (not enforced client-side)
    pub device_number: String,

    pub product_name: String,

    #[serde(default)]
    pub model_name: Option<String>,

    pub platform: Platform,

    pub os_version: String,

    #[serde(default)]
    pub is_rooted_or_jailbroken: bool,

    pub status: DeviceStatus,

    /// Present exactly when the device is rented
    #[serde(default)]
    pub current_renter: Option<String>,
}

impl Device {
    /// A device is rented if and only if a renter is recorded for it.
    pub fn is_consistent(&self) -> bool {
        (self.status == DeviceStatus::Rented) == self.current_renter.is_some()
    }

    /// Short label used when confirming destructive operations,
    /// eg. "NO-12 - Galaxy S24"
    pub fn label(&self) -> String {
        format!("{} - {}", self.device_number, self.product_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Active,
    Returned,
}

/// Snapshot of device identity taken when the rental was opened. The
/// device itself may be edited or deleted afterwards, the rental record
/// keeps what it was rented as.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RentalDevice {
    pub id: DeviceId,
    pub device_number: String,
    pub platform: Platform,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: RentalId,
    pub renter_name: String,
    pub device: RentalDevice,
    pub rented_at: DateTime<Utc>,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    pub status: RentalStatus,
}

impl Rental {
    /// Elapsed rental time, `None` while the rental is still active.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.returned_at.map(|end| end - self.rented_at)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RentalStats {
    pub total_rentals: u64,
    pub active_rentals: u64,
    pub returned_rentals: u64,
}

/// Global system status, cached locally and refreshed by the status
/// poller. While test mode is on, new rentals are suspended; returns are
/// not affected.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub is_test_mode: bool,

    #[serde(default)]
    pub test_type: Option<String>,

    #[serde(default)]
    pub test_message: Option<String>,

    #[serde(default)]
    pub test_start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub test_end_date: Option<DateTime<Utc>>,
}

/// The authenticated administrator principal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    pub id: i64,
    pub username: String,
}
