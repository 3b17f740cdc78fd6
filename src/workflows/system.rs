use chrono::{DateTime, Utc};

use crate::models::SystemStatus;
use crate::remote::api::{Api, SystemConfigPayload};
use crate::store::Store;

use super::WorkflowError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SystemConfigErrors {
    pub test_message: Option<String>,
    pub test_end_date: Option<String>,
    pub general: Option<String>,
}

impl SystemConfigErrors {
    pub fn is_empty(&self) -> bool {
        self.test_message.is_none() && self.test_end_date.is_none() && self.general.is_none()
    }
}

/// Edit form for the global system configuration. Opens from the
/// last-fetched status; cancelling restores that baseline rather than
/// a blank state.
#[derive(Debug, Clone)]
pub struct SystemConfigForm {
    pub is_test_mode: bool,
    pub test_message: String,
    pub test_type: String,
    pub test_start_date: Option<DateTime<Utc>>,
    pub test_end_date: Option<DateTime<Utc>>,
    pub errors: SystemConfigErrors,
    baseline: SystemStatus,
}

impl SystemConfigForm {
    pub fn from_status(status: &SystemStatus) -> Self {
        Self {
            is_test_mode: status.is_test_mode,
            test_message: status.test_message.clone().unwrap_or_default(),
            test_type: status.test_type.clone().unwrap_or_default(),
            test_start_date: status.test_start_date,
            test_end_date: status.test_end_date,
            errors: SystemConfigErrors::default(),
            baseline: status.clone(),
        }
    }

    /// Discard edits and restore the last-fetched configuration.
    pub fn cancel(&mut self) {
        let baseline = self.baseline.clone();
        *self = Self::from_status(&baseline);
    }

    fn validate(&mut self) -> bool {
        let mut errors = SystemConfigErrors::default();
        if self.is_test_mode && self.test_message.trim().is_empty() {
            errors.test_message = Some("a notice message is required while test mode is on".into());
        }
        if let (Some(start), Some(end)) = (self.test_start_date, self.test_end_date) {
            if end <= start {
                errors.test_end_date =
                    Some("the end of the test window must come after its start".into());
            }
        }
        let valid = errors.is_empty();
        self.errors = errors;
        valid
    }

    fn payload(&self) -> SystemConfigPayload {
        let test_message = self.test_message.trim();
        let test_type = self.test_type.trim();
        SystemConfigPayload {
            is_test_mode: self.is_test_mode,
            test_message: (!test_message.is_empty()).then(|| test_message.to_owned()),
            test_start_date: self.test_start_date,
            test_end_date: self.test_end_date,
            test_type: (!test_type.is_empty()).then(|| test_type.to_owned()),
        }
    }

    /// Submit the full configuration. The store's cached status is
    /// replaced with whatever the backend confirms.
    pub async fn submit(&mut self, api: &Api, store: &Store) -> Result<SystemStatus, WorkflowError> {
        if !self.validate() {
            return Err(WorkflowError::Validation);
        }

        match api.update_system_config(&self.payload()).await {
            Ok(response) => {
                let status = match response.config {
                    Some(config) => {
                        store.set_system_status(config.clone()).await;
                        config
                    }
                    None => store.fetch_system_status().await?,
                };
                self.baseline = status.clone();
                Ok(status)
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

/// Flip test mode without touching any other configuration field.
pub async fn quick_toggle(api: &Api, store: &Store) -> Result<SystemStatus, WorkflowError> {
    let response = api.toggle_test_mode().await?;
    let status = match response.config {
        Some(config) => {
            store.set_system_status(config.clone()).await;
            config
        }
        None => store.fetch_system_status().await?,
    };
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate;
    use crate::remote::request::Backend;
    use crate::session::CredentialStore;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_api(url: &str, dir: &Path) -> (Api, Store) {
        let credentials = Arc::new(CredentialStore::open(dir));
        let (backend, _interceptions) =
            Backend::new(url.parse().unwrap(), Duration::from_secs(5), credentials);
        let api = Api::new(backend);
        let store = Store::new(api.clone());
        (api, store)
    }

    #[tokio::test]
    async fn it_requires_a_message_to_enable_test_mode() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (api, store) = test_api(&server.url(), dir.path());

        let patch = server
            .mock("PATCH", "/system-config")
            .expect(0)
            .create_async()
            .await;

        let mut form = SystemConfigForm::from_status(&SystemStatus::default());
        form.is_test_mode = true;

        let result = form.submit(&api, &store).await;

        assert!(matches!(result, Err(WorkflowError::Validation)));
        assert!(form.errors.test_message.is_some());

        patch.assert_async().await;
    }

    #[tokio::test]
    async fn it_rejects_a_window_that_ends_before_it_starts() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (api, store) = test_api(&server.url(), dir.path());

        let patch = server
            .mock("PATCH", "/system-config")
            .expect(0)
            .create_async()
            .await;

        let mut form = SystemConfigForm::from_status(&SystemStatus::default());
        form.is_test_mode = true;
        form.test_message = "compat test".into();
        form.test_start_date = Some(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
        form.test_end_date = Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());

        let result = form.submit(&api, &store).await;

        assert!(matches!(result, Err(WorkflowError::Validation)));
        assert!(form.errors.test_end_date.is_some());

        patch.assert_async().await;
    }

    #[tokio::test]
    async fn it_submits_a_valid_configuration_and_caches_the_result() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (api, store) = test_api(&server.url(), dir.path());

        let patch = server
            .mock("PATCH", "/system-config")
            .match_body(Matcher::Json(json!({
                "isTestMode": true,
                "testMessage": "compat test",
                "testStartDate": null,
                "testEndDate": null,
                "testType": null
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": "updated",
                    "config": {"isTestMode": true, "testMessage": "compat test"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut form = SystemConfigForm::from_status(&SystemStatus::default());
        form.is_test_mode = true;
        form.test_message = "compat test".into();

        let status = form.submit(&api, &store).await.unwrap();

        assert!(status.is_test_mode);
        // the rental gate follows, returns stay unaffected
        assert!(!gate::rental_allowed(&status));
        assert!(store.system_status().await.unwrap().is_test_mode);

        patch.assert_async().await;
    }

    #[tokio::test]
    async fn it_keeps_the_form_open_on_a_backend_rejection() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (api, store) = test_api(&server.url(), dir.path());

        let patch = server
            .mock("PATCH", "/system-config")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "end date is in the past"}"#)
            .create_async()
            .await;

        let mut form = SystemConfigForm::from_status(&SystemStatus::default());
        form.is_test_mode = true;
        form.test_message = "compat test".into();

        let result = form.submit(&api, &store).await;

        assert!(matches!(result, Err(WorkflowError::Rejected(_))));
        assert_eq!(form.errors.general.as_deref(), Some("end date is in the past"));
        assert_eq!(form.test_message, "compat test");

        patch.assert_async().await;
    }

    #[tokio::test]
    async fn cancel_restores_the_last_fetched_configuration() {
        let baseline = SystemStatus {
            is_test_mode: true,
            test_message: Some("compat test".into()),
            test_type: Some("compatibility".into()),
            ..SystemStatus::default()
        };

        let mut form = SystemConfigForm::from_status(&baseline);
        form.is_test_mode = false;
        form.test_message = "scribbles".into();
        form.errors.general = Some("leftover".into());

        form.cancel();

        assert!(form.is_test_mode);
        assert_eq!(form.test_message, "compat test");
        assert_eq!(form.test_type, "compatibility");
        assert!(form.errors.is_empty());
    }

    #[tokio::test]
    async fn the_quick_toggle_flips_test_mode_without_other_fields() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (api, store) = test_api(&server.url(), dir.path());

        let toggle = server
            .mock("POST", "/system-config/toggle")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": "test mode enabled",
                    "config": {"isTestMode": true, "testMessage": "compat test"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let status = quick_toggle(&api, &store).await.unwrap();

        assert!(status.is_test_mode);
        assert!(!gate::rental_allowed(&status));
        assert!(store.system_status().await.unwrap().is_test_mode);

        toggle.assert_async().await;
    }

    #[tokio::test]
    async fn the_quick_toggle_refetches_when_no_config_is_echoed() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (api, store) = test_api(&server.url(), dir.path());

        let toggle = server
            .mock("POST", "/system-config/toggle")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "test mode disabled"}"#)
            .create_async()
            .await;
        let status_mock = server
            .mock("GET", "/system-status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isTestMode": false}"#)
            .create_async()
            .await;

        let status = quick_toggle(&api, &store).await.unwrap();

        assert!(!status.is_test_mode);
        assert!(gate::rental_allowed(&status));

        toggle.assert_async().await;
        status_mock.assert_async().await;
    }
}
