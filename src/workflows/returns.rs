use thiserror::Error;

use crate::models::{Device, DeviceId, DeviceStatus};
use crate::remote::api::{Api, ReturnRequest};
use crate::store::Store;

use super::{refresh_after_mutation, WorkflowError};

/// Which form field a backend rejection refers to.
///
/// The backend returns free text, so this is a substring heuristic
/// covering the English and Korean message variants. Anything it does
/// not recognize lands on the general banner; it is a compatibility
/// shim until the backend returns structured error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnErrorField {
    Password,
    RenterName,
    General,
}

pub fn classify_return_error(message: &str) -> ReturnErrorField {
    if message.contains("password") || message.contains("비밀번호") {
        ReturnErrorField::Password
    } else if message.contains("renter") || message.contains("대여자") {
        ReturnErrorField::RenterName
    } else {
        ReturnErrorField::General
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReturnFormErrors {
    pub renter_name: Option<String>,
    pub password: Option<String>,
    pub general: Option<String>,
}

impl ReturnFormErrors {
    pub fn is_empty(&self) -> bool {
        self.renter_name.is_none() && self.password.is_none() && self.general.is_none()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReturnRefusal {
    #[error("{device} is not rented")]
    NotRented { device: String },
}

/// Two-factor device return: the renter's name must match the recorded
/// renter and the shared QA password must be presented. Both values are
/// opaque to the client and validated by the backend only; this form
/// just classifies the returned error. A return is irreversible once
/// the backend accepts it, which the presentation layer warns about
/// before submission.
#[derive(Debug, Clone)]
pub struct ReturnForm {
    device_id: DeviceId,
    pub device_label: String,
    pub current_renter: Option<String>,
    pub renter_name: String,
    pub password: String,
    pub errors: ReturnFormErrors,
}

impl ReturnForm {
    /// Open the form for a rented device.
    pub fn open(device: &Device) -> Result<Self, ReturnRefusal> {
        if device.status != DeviceStatus::Rented {
            return Err(ReturnRefusal::NotRented {
                device: device.label(),
            });
        }
        Ok(Self {
            device_id: device.id,
            device_label: device.label(),
            current_renter: device.current_renter.clone(),
            renter_name: String::new(),
            password: String::new(),
            errors: ReturnFormErrors::default(),
        })
    }

    fn validate(&mut self) -> bool {
        let mut errors = ReturnFormErrors::default();
        if self.renter_name.trim().is_empty() {
            errors.renter_name = Some("the renter's name is required".into());
        }
        if self.password.trim().is_empty() {
            errors.password = Some("the QA password is required".into());
        }
        let valid = errors.is_empty();
        self.errors = errors;
        valid
    }

    pub async fn submit(&mut self, api: &Api, store: &Store) -> Result<(), WorkflowError> {
        if !self.validate() {
            return Err(WorkflowError::Validation);
        }

        let request = ReturnRequest {
            renter_name: self.renter_name.trim(),
            password: &self.password,
        };

        match api.return_device(self.device_id, &request).await {
            Ok(()) => {
                refresh_after_mutation(store).await;
                Ok(())
            }
            Err(err) => {
                let err = WorkflowError::from(err);
                if let WorkflowError::Rejected(message) = &err {
                    match classify_return_error(message) {
                        ReturnErrorField::Password => {
                            self.errors.password = Some("the QA password is not correct".into());
                        }
                        ReturnErrorField::RenterName => {
                            self.errors.renter_name =
                                Some("the renter's name does not match".into());
                        }
                        ReturnErrorField::General => {
                            self.errors.general = Some(message.clone());
                        }
                    }
                }
                Err(err)
            }
        }
    }
}
