/*
Application shell wiring: one credential store, one transport, one
session, one resource store, and the status poller bound to the
session's lifetime.

Interceptions raised by the transport are drained here and converged
on, independent of which workflow triggered the offending call. The
session state, not the state of any in-flight request, is what the
shell trusts: a mutation resolving after teardown changes nothing.
*/

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::config::Config;
use crate::remote::api::Api;
use crate::remote::request::{Backend, Interception};
use crate::session::{CredentialStore, Session};
use crate::store::poll::StatusPoller;
use crate::store::Store;

pub struct App {
    pub config: Config,
    pub api: Api,
    pub session: Session,
    pub store: Arc<Store>,
    interceptions: UnboundedReceiver<Interception>,
    poller: Option<StatusPoller>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let credentials = Arc::new(CredentialStore::open(&config.state_dir));
        let (backend, interceptions) = Backend::new(
            config.api_endpoint.clone(),
            config.request_timeout,
            Arc::clone(&credentials),
        );
        let api = Api::new(backend);
        let session = Session::new(api.clone(), credentials);
        let store = Arc::new(Store::new(api.clone()));

        Self {
            config,
            api,
            session,
            store,
            interceptions,
            poller: None,
        }
    }

    /// Verify any stored credential and, if the session comes up
    /// authenticated, start the status poller.
    pub async fn bootstrap(&mut self) {
        self.session.bootstrap().await;
        if self.session.is_authenticated() {
            self.start_poller();
        }
    }

    pub fn start_poller(&mut self) {
        if self.poller.is_none() {
            self.poller = Some(StatusPoller::start(
                Arc::clone(&self.store),
                self.config.status_poll_interval,
            ));
        }
    }

    pub fn poller_running(&self) -> bool {
        self.poller
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Explicit logout: the credential, the cached resources and the
    /// poller go together.
    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.teardown_resources().await;
        info!("logged out");
    }

    async fn teardown_resources(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.store.clear().await;
    }

    /// Drain interceptions raised by the transport since the last call
    /// and converge the local state. Returns the outcome the
    /// presentation layer must navigate on, access denial taking
    /// precedence.
    pub async fn process_interceptions(&mut self) -> Option<Interception> {
        let mut outcome = None;
        while let Ok(interception) = self.interceptions.try_recv() {
            match interception {
                Interception::SessionExpired => {
                    // the transport already dropped the credential;
                    // drop everything that was gated on it
                    warn!("session expired, tearing down");
                    self.session.expire();
                    self.teardown_resources().await;
                    if outcome.is_none() {
                        outcome = Some(Interception::SessionExpired);
                    }
                }
                Interception::AccessDenied => {
                    outcome = Some(Interception::AccessDenied);
                }
            }
        }
        outcome
    }
}
