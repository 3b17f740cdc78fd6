use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::util::http::Uri;
use crate::util::state;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// Runtime configuration, assembled from CLI arguments and environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Backend API endpoint
    pub api_endpoint: Uri,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Interval of the system status poll
    pub status_poll_interval: Duration,

    /// Directory holding the persisted session record
    pub state_dir: PathBuf,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_endpoint: cli.api_endpoint.clone(),
            request_timeout: cli.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            status_poll_interval: cli
                .status_poll_interval
                .unwrap_or(DEFAULT_STATUS_POLL_INTERVAL),
            state_dir: cli
                .state_dir
                .clone()
                .unwrap_or_else(state::default_state_dir),
        }
    }
}
