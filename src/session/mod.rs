/*
Administrator session lifecycle.

A session is created on successful login or on successful startup
verification of a previously stored credential, and destroyed on
logout, on verification failure, or whenever the transport layer sees
the backend reject the credential. There is no automatic retry of a
failed verification.
*/

mod credentials;

pub use credentials::{CredentialStore, Credentials};

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::models::Manager;
use crate::remote::api::{Api, LoginRequest};
use crate::util::state::ReadWriteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Startup state, before the stored credential has been looked at
    Unverified,
    /// A stored credential is being verified against the backend
    Verifying,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// Deliberately generic: the backend's detail is not echoed, so the
    /// caller cannot tell which field was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("failed to persist session: {0}")]
    Storage(#[from] ReadWriteError),
}

pub struct Session {
    api: Api,
    credentials: Arc<CredentialStore>,
    state: SessionState,
    ready: bool,
}

impl Session {
    pub fn new(api: Api, credentials: Arc<CredentialStore>) -> Self {
        Self {
            api,
            credentials,
            state: SessionState::Unverified,
            ready: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Whether startup verification has finished, regardless of its
    /// outcome.
    pub fn ready(&self) -> bool {
        self.ready
    }

    pub async fn manager(&self) -> Option<Manager> {
        self.credentials.manager().await
    }

    /// Verify any stored credential against the backend. Ends in
    /// `Authenticated` or `Unauthenticated` and always signals
    /// readiness.
    #[instrument(skip_all)]
    pub async fn bootstrap(&mut self) {
        match self.credentials.load().await {
            Ok(Some(credentials)) => {
                self.state = SessionState::Verifying;
                match self.api.verify(&credentials.token).await {
                    Ok(()) => {
                        info!("session restored for {}", credentials.manager.username);
                        self.state = SessionState::Authenticated;
                    }
                    Err(err) => {
                        debug!("stored session rejected: {err}");
                        // a 401 already cleared the store; clear for
                        // every other verification failure as well
                        self.credentials.clear().await;
                        self.state = SessionState::Unauthenticated;
                    }
                }
            }
            Ok(None) => {
                self.state = SessionState::Unauthenticated;
            }
            Err(err) => {
                warn!("failed to read stored session: {err}");
                self.state = SessionState::Unauthenticated;
            }
        }
        self.ready = true;
    }

    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Manager, LoginError> {
        match self.api.login(&LoginRequest { username, password }).await {
            Ok(response) => {
                let manager = response.user.clone();
                self.credentials
                    .store(Credentials {
                        token: response.access_token,
                        manager: response.user,
                    })
                    .await?;
                self.state = SessionState::Authenticated;
                info!("logged in as {}", manager.username);
                Ok(manager)
            }
            Err(err) => {
                debug!("login rejected: {err}");
                Err(LoginError::InvalidCredentials)
            }
        }
    }

    /// End the session and drop the stored credential. The shell clears
    /// the cached resources in the same step, so the next administrator
    /// never sees stale data.
    pub async fn logout(&mut self) {
        self.credentials.clear().await;
        self.state = SessionState::Unauthenticated;
    }

    /// Converge on a session the transport layer has already torn down.
    pub fn expire(&mut self) {
        self.state = SessionState::Unauthenticated;
    }
}
