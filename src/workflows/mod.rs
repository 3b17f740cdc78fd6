/*
Short-lived mutation state machines.

Every workflow follows the same shape: validate locally (a validation
failure blocks submission before any network call), submit, refresh the
snapshot and close on success, stay open on failure with the backend's
error detail mapped onto a field-level or general error and the form
contents intact for correction. There is no optimistic merging and no
automatic retry.
*/

pub mod device;
pub mod returns;
pub mod system;

use thiserror::Error;
use tracing::warn;

use crate::remote::request::RequestError;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Local validation failed; field errors are recorded on the form
    /// and nothing was sent.
    #[error("validation failed")]
    Validation,

    /// The backend rejected the submission; the workflow stays open
    /// with the error mapped onto the form.
    #[error("{0}")]
    Rejected(String),

    /// Terminal transport outcomes pass through untouched; the
    /// interception has already been raised.
    #[error(transparent)]
    Terminal(RequestError),
}

impl From<RequestError> for WorkflowError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::AccessDenied | RequestError::Unauthorized => WorkflowError::Terminal(err),
            RequestError::Status { message, .. } => WorkflowError::Rejected(message),
            other => WorkflowError::Rejected(other.to_string()),
        }
    }
}

/// Refresh the snapshot after a successful mutation. A refresh failure
/// does not undo the mutation; it surfaces as a notice and the next
/// manual refresh recovers.
pub(crate) async fn refresh_after_mutation(store: &Store) {
    if let Err(err) = store.refresh().await {
        warn!("refresh after mutation failed: {err}");
    }
}
