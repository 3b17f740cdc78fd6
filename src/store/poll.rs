/*
Periodic system-status poll.

The poll runs only while a session is active: the shell starts it when
the session comes up authenticated and stops it on logout or expiry.
The retained handle is the scoped acquisition; dropping it aborts the
task, so an orphaned timer cannot outlive the session.
*/

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{instrument, trace, warn};

use super::Store;

pub struct StatusPoller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    /// Start polling immediately and then once per `period`.
    pub fn start(store: Arc<Store>, period: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(store, period, shutdown_rx));
        Self { shutdown, handle }
    }

    /// Request a cooperative shutdown.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[instrument(name = "status_poll", skip_all)]
async fn run(store: Arc<Store>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // poll failures are non-fatal, the next tick tries again
                if let Err(err) = store.fetch_system_status().await {
                    warn!("system status poll failed: {err}");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    trace!("stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::api::Api;
    use crate::remote::request::Backend;
    use crate::session::CredentialStore;
    use mockito::Server;

    fn test_store(url: &str, dir: &std::path::Path) -> Arc<Store> {
        let credentials = Arc::new(CredentialStore::open(dir));
        let (backend, _interceptions) =
            Backend::new(url.parse().unwrap(), Duration::from_secs(5), credentials);
        Arc::new(Store::new(Api::new(backend)))
    }

    #[tokio::test]
    async fn it_polls_the_system_status_into_the_store() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        let mock = server
            .mock("GET", "/system-status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isTestMode": true, "testMessage": "compat test"}"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let poller = StatusPoller::start(Arc::clone(&store), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.system_status().await.unwrap().is_test_mode);

        poller.stop();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_stops_when_asked_and_does_not_outlive_the_session() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        let _mock = server
            .mock("GET", "/system-status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isTestMode": false}"#)
            .create_async()
            .await;

        let poller = StatusPoller::start(store, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(30)).await;

        poller.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(poller.is_finished());
    }

    #[tokio::test]
    async fn it_keeps_polling_through_failures() {
        let mut server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&server.url(), dir.path());

        let failing = server
            .mock("GET", "/system-status")
            .with_status(500)
            .with_body("boom")
            .expect_at_least(2)
            .create_async()
            .await;

        let poller = StatusPoller::start(Arc::clone(&store), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(90)).await;

        // the poll survived its failures and the cache stayed empty
        assert!(!poller.is_finished());
        assert!(store.system_status().await.is_none());

        poller.stop();
        failing.assert_async().await;
    }
}
