use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Device, DeviceId, Manager, Platform, Rental, RentalStats, SystemStatus};

use super::request::{Backend, Channel, RequestError};

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DevicePayload {
    pub device_number: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub platform: Platform,
    pub os_version: String,
    pub is_rooted_or_jailbroken: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest<'a> {
    pub renter_name: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: Manager,
}

#[derive(Serialize, Debug)]
struct VerifyRequest<'a> {
    token: &'a str,
}

/// Full system configuration submission. Optional fields are sent as
/// explicit nulls so that clearing a field on the backend works.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfigPayload {
    pub is_test_mode: bool,
    pub test_message: Option<String>,
    pub test_start_date: Option<DateTime<Utc>>,
    pub test_end_date: Option<DateTime<Utc>>,
    pub test_type: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub config: Option<SystemStatus>,
}

/// Typed surface over the backend REST boundary, one method per
/// operation. Channel assignment follows the backend's authorization
/// model: inventory and configuration mutations are credentialed, the
/// rental history and system status are public reads.
#[derive(Clone)]
pub struct Api {
    backend: Backend,
}

impl Api {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Admin device list, including renter detail.
    pub async fn list_devices(&self) -> Result<Vec<Device>, RequestError> {
        self.backend.get(Channel::Credentialed, "/devices").await
    }

    pub async fn create_device(&self, payload: &DevicePayload) -> Result<Device, RequestError> {
        self.backend
            .post(Channel::Credentialed, "/devices", payload)
            .await
    }

    pub async fn update_device(
        &self,
        id: DeviceId,
        payload: &DevicePayload,
    ) -> Result<Device, RequestError> {
        self.backend
            .patch(Channel::Credentialed, &format!("/devices/{id}"), payload)
            .await
    }

    pub async fn delete_device(&self, id: DeviceId) -> Result<(), RequestError> {
        self.backend
            .delete(Channel::Credentialed, &format!("/devices/{id}"))
            .await
    }

    /// Two-factor device return. Both values are validated by the
    /// backend only.
    pub async fn return_device(
        &self,
        id: DeviceId,
        request: &ReturnRequest<'_>,
    ) -> Result<(), RequestError> {
        self.backend
            .post_unit(Channel::Credentialed, &format!("/devices/return/{id}"), request)
            .await
    }

    pub async fn rentals(&self) -> Result<Vec<Rental>, RequestError> {
        self.backend.get(Channel::Public, "/rentals").await
    }

    pub async fn active_rentals(&self) -> Result<Vec<Rental>, RequestError> {
        self.backend.get(Channel::Public, "/rentals/active").await
    }

    pub async fn returned_rentals(&self) -> Result<Vec<Rental>, RequestError> {
        self.backend.get(Channel::Public, "/rentals/returned").await
    }

    pub async fn rental_stats(&self) -> Result<RentalStats, RequestError> {
        self.backend.get(Channel::Public, "/rentals/stats").await
    }

    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, RequestError> {
        self.backend.post(Channel::Public, "/auth/login", request).await
    }

    /// Verify a stored token. Any 2xx reply means the token is still
    /// good; the body carries nothing this client needs.
    pub async fn verify(&self, token: &str) -> Result<(), RequestError> {
        self.backend
            .post_unit(Channel::Public, "/auth/verify", &VerifyRequest { token })
            .await
    }

    pub async fn system_status(&self) -> Result<SystemStatus, RequestError> {
        self.backend.get(Channel::Public, "/system-status").await
    }

    pub async fn update_system_config(
        &self,
        payload: &SystemConfigPayload,
    ) -> Result<ConfigResponse, RequestError> {
        self.backend
            .patch(Channel::Credentialed, "/system-config", payload)
            .await
    }

    /// Flip test mode without touching any other configuration field.
    pub async fn toggle_test_mode(&self) -> Result<ConfigResponse, RequestError> {
        self.backend
            .post_empty(Channel::Credentialed, "/system-config/toggle")
            .await
    }
}
