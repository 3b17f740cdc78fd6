use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{DeviceId, Platform};
use crate::store::{PlatformFilter, StatusFilter};
use crate::util::http::Uri;

fn parse_duration(s: &str) -> Result<Duration, ParseIntError> {
    let millis: u64 = s.parse()?;
    Ok(Duration::from_millis(millis))
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// Backend API endpoint URI
    #[arg(env = "DEVPOOL_API_ENDPOINT", long = "api-endpoint", value_name = "uri")]
    pub api_endpoint: Uri,

    /// Request timeout in milliseconds
    #[arg(
        env = "DEVPOOL_REQUEST_TIMEOUT_MS",
        long = "request-timeout-ms",
        value_name = "ms",
        value_parser = parse_duration
    )]
    pub request_timeout: Option<Duration>,

    /// System status poll interval in milliseconds
    #[arg(
        env = "DEVPOOL_STATUS_POLL_INTERVAL_MS",
        long = "status-poll-interval-ms",
        value_name = "ms",
        value_parser = parse_duration
    )]
    pub status_poll_interval: Option<Duration>,

    /// Directory for the persisted session record
    #[arg(env = "DEVPOOL_STATE_DIR", long = "state-dir", value_name = "path")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Log in as an administrator
    Login {
        #[arg(value_name = "username")]
        username: String,

        /// Password; prompted on stdin when not given
        #[arg(long, env = "DEVPOOL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the session and clear the stored credential
    Logout,

    /// Show session, inventory and system status at a glance
    Status,

    /// Device inventory operations
    #[command(subcommand)]
    Devices(DeviceCommand),

    /// Rental history
    Rentals {
        /// Only rentals that are still open
        #[arg(long, conflicts_with = "returned")]
        active: bool,

        /// Only rentals that have been closed
        #[arg(long)]
        returned: bool,

        /// Filter by renter name or device number
        #[arg(long, value_name = "query")]
        search: Option<String>,
    },

    /// System test-mode configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Live dashboard; the default when no command is given
    Console,
}

#[derive(Clone, Debug, Subcommand)]
pub enum DeviceCommand {
    /// List devices, optionally filtered
    List {
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,

        #[arg(long, value_enum, default_value = "all")]
        platform: PlatformArg,
    },

    /// Register a new device
    Add {
        /// Display label, eg. "NO-12"
        #[arg(long, value_name = "label")]
        number: String,

        #[arg(long, value_name = "name")]
        product: String,

        #[arg(long, value_name = "name")]
        model: Option<String>,

        #[arg(long, value_name = "version")]
        os: String,

        #[arg(long, value_enum, default_value = "android")]
        platform: PlatformValue,

        /// Mark the device as rooted/jailbroken
        #[arg(long)]
        rooted: bool,
    },

    /// Edit an existing device
    Edit {
        #[arg(value_name = "id")]
        id: DeviceId,

        #[arg(long, value_name = "label")]
        number: Option<String>,

        #[arg(long, value_name = "name")]
        product: Option<String>,

        #[arg(long, value_name = "name")]
        model: Option<String>,

        #[arg(long, value_name = "version")]
        os: Option<String>,

        #[arg(long, value_enum)]
        platform: Option<PlatformValue>,

        #[arg(long)]
        rooted: Option<bool>,
    },

    /// Delete a device; only available devices can be deleted
    Rm {
        #[arg(value_name = "id")]
        id: DeviceId,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Return a rented device (requires the shared QA password)
    Return {
        #[arg(value_name = "id")]
        id: DeviceId,

        /// Name of the current renter, as recorded on the device
        #[arg(long, value_name = "name")]
        renter: String,

        /// Shared QA password; prompted on stdin when not given
        #[arg(long, env = "DEVPOOL_QA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the current system configuration
    Show,

    /// Flip test mode without touching any other field
    Toggle,

    /// Edit the full configuration
    Set {
        /// Turn test mode on
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Turn test mode off
        #[arg(long)]
        off: bool,

        /// Notice shown while test mode is on
        #[arg(long, value_name = "text")]
        message: Option<String>,

        /// Kind of test being run, eg. "compatibility"
        #[arg(long = "type", value_name = "text")]
        test_type: Option<String>,

        /// Start of the test window (RFC 3339)
        #[arg(long, value_name = "timestamp")]
        start: Option<DateTime<Utc>>,

        /// End of the test window (RFC 3339)
        #[arg(long, value_name = "timestamp")]
        end: Option<DateTime<Utc>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    All,
    Available,
    Rented,
}

impl From<StatusArg> for StatusFilter {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::All => StatusFilter::All,
            StatusArg::Available => StatusFilter::Available,
            StatusArg::Rented => StatusFilter::Rented,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    All,
    Android,
    Ios,
}

impl From<PlatformArg> for PlatformFilter {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::All => PlatformFilter::All,
            PlatformArg::Android => PlatformFilter::Android,
            PlatformArg::Ios => PlatformFilter::Ios,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlatformValue {
    Android,
    Ios,
}

impl From<PlatformValue> for Platform {
    fn from(value: PlatformValue) -> Self {
        match value {
            PlatformValue::Android => Platform::Android,
            PlatformValue::Ios => Platform::Ios,
        }
    }
}

pub fn parse() -> Cli {
    Parser::parse()
}
