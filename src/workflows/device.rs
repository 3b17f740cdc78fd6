use thiserror::Error;

use crate::models::{Device, DeviceId, DeviceStatus, Platform};
use crate::remote::api::{Api, DevicePayload};
use crate::store::Store;

use super::{refresh_after_mutation, WorkflowError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceFormErrors {
    pub device_number: Option<String>,
    pub product_name: Option<String>,
    pub os_version: Option<String>,
    pub general: Option<String>,
}

impl DeviceFormErrors {
    pub fn is_empty(&self) -> bool {
        self.device_number.is_none()
            && self.product_name.is_none()
            && self.os_version.is_none()
            && self.general.is_none()
    }
}

/// Create/edit form for a device. Create mode starts blank with the
/// platform defaulted to Android and the rooted flag off; edit mode
/// pre-populates from the selected device.
#[derive(Debug, Clone)]
pub struct DeviceForm {
    pub device_number: String,
    pub product_name: String,
    pub model_name: String,
    pub os_version: String,
    pub platform: Platform,
    pub is_rooted_or_jailbroken: bool,
    pub errors: DeviceFormErrors,
    editing: Option<DeviceId>,
}

impl DeviceForm {
    pub fn create() -> Self {
        Self {
            device_number: String::new(),
            product_name: String::new(),
            model_name: String::new(),
            os_version: String::new(),
            platform: Platform::Android,
            is_rooted_or_jailbroken: false,
            errors: DeviceFormErrors::default(),
            editing: None,
        }
    }

    pub fn edit(device: &Device) -> Self {
        Self {
            device_number: device.device_number.clone(),
            product_name: device.product_name.clone(),
            model_name: device.model_name.clone().unwrap_or_default(),
            os_version: device.os_version.clone(),
            platform: device.platform,
            is_rooted_or_jailbroken: device.is_rooted_or_jailbroken,
            errors: DeviceFormErrors::default(),
            editing: Some(device.id),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    fn validate(&mut self) -> bool {
        let mut errors = DeviceFormErrors::default();
        if self.device_number.trim().is_empty() {
            errors.device_number = Some("a device number is required".into());
        }
        if self.product_name.trim().is_empty() {
            errors.product_name = Some("a product name is required".into());
        }
        if self.os_version.trim().is_empty() {
            errors.os_version = Some("an OS version is required".into());
        }
        let valid = errors.is_empty();
        self.errors = errors;
        valid
    }

    fn payload(&self) -> DevicePayload {
        let model_name = self.model_name.trim();
        DevicePayload {
            device_number: self.device_number.trim().to_owned(),
            product_name: self.product_name.trim().to_owned(),
            model_name: (!model_name.is_empty()).then(|| model_name.to_owned()),
            platform: self.platform,
            os_version: self.os_version.trim().to_owned(),
            is_rooted_or_jailbroken: self.is_rooted_or_jailbroken,
        }
    }

    /// Submit the form. On success the snapshot is refreshed and the
    /// form can be closed; on failure the form stays open with its
    /// contents intact and the error recorded.
    pub async fn submit(&mut self, api: &Api, store: &Store) -> Result<Device, WorkflowError> {
        if !self.validate() {
            return Err(WorkflowError::Validation);
        }

        let payload = self.payload();
        let result = match self.editing {
            Some(id) => api.update_device(id, &payload).await,
            None => api.create_device(&payload).await,
        };

        match result {
            Ok(device) => {
                refresh_after_mutation(store).await;
                Ok(device)
            }
            Err(err) => {
                let err = WorkflowError::from(err);
                if let WorkflowError::Rejected(message) = &err {
                    self.errors.general = Some(message.clone());
                }
                Err(err)
            }
        }
    }
}

/// Why a deletion was refused before reaching the backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeleteRefusal {
    #[error("{device} is currently rented and cannot be deleted")]
    Rented { device: String },
}

/// A deletion that passed the local guard and awaits explicit
/// confirmation. Nothing is sent until [`PendingDelete::execute`].
#[derive(Debug)]
pub struct PendingDelete {
    id: DeviceId,
    label: String,
}

impl PendingDelete {
    /// Deletion is only permitted for available devices; a rented
    /// device is refused here, before any network call.
    pub fn prepare(device: &Device) -> Result<Self, DeleteRefusal> {
        if device.status == DeviceStatus::Rented {
            return Err(DeleteRefusal::Rented {
                device: device.label(),
            });
        }
        Ok(Self {
            id: device.id,
            label: device.label(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn execute(self, api: &Api, store: &Store) -> Result<(), WorkflowError> {
        api.delete_device(self.id).await?;
        refresh_after_mutation(store).await;
        Ok(())
    }
}
