mod app;
mod cli;
mod cmd;
mod config;
mod gate;
mod models;
mod remote;
mod session;
mod store;
mod util;
mod workflows;

use anyhow::Result;
use tracing::debug;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::app::App;
use crate::cli::Command;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for human-readable logs
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or(
                EnvFilter::default()
                    .add_directive("info".parse()?)
                    .add_directive("hyper=error".parse()?)
                    .add_directive("reqwest=warn".parse()?),
            ),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false).without_time()),
        )
        .init();

    let cli = cli::parse();
    let config = Config::from_cli(&cli);
    debug!("{:#?}", config);

    let mut app = App::new(config);
    app.bootstrap().await;

    match cli.command.unwrap_or(Command::Console) {
        Command::Login { username, password } => cmd::login(&mut app, &username, password).await,
        Command::Logout => cmd::logout(&mut app).await,
        Command::Status => cmd::status(&mut app).await,
        Command::Devices(command) => cmd::devices(&mut app, command).await,
        Command::Rentals {
            active,
            returned,
            search,
        } => cmd::rentals(&mut app, active, returned, search).await,
        Command::Config(command) => cmd::config(&mut app, command).await,
        Command::Console => cmd::console(&mut app).await,
    }
}
