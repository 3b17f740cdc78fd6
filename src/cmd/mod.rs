mod console;
mod devices;
mod rentals;
mod session;
mod system;

pub use console::console;
pub use devices::devices;
pub use rentals::rentals;
pub use session::{login, logout, status};
pub use system::config;

use std::io::{self, BufRead, Write};

use anyhow::Context;

use crate::app::App;
use crate::remote::request::Interception;

/// Converge on transport interceptions after a command ran. A terminal
/// outcome turns into an error so the process exits non-zero.
pub(crate) async fn settle(app: &mut App) -> anyhow::Result<()> {
    match app.process_interceptions().await {
        Some(Interception::AccessDenied) => anyhow::bail!(
            "access denied: this network address is not allowed to use the system"
        ),
        Some(Interception::SessionExpired) => {
            anyhow::bail!("the session has expired, log in again")
        }
        None => Ok(()),
    }
}

/// The admin surface requires a bootstrapped, authenticated session.
pub(crate) fn require_session(app: &App) -> anyhow::Result<()> {
    if !app.session.ready() {
        anyhow::bail!("startup verification has not finished");
    }
    if !app.session.is_authenticated() {
        anyhow::bail!("not logged in, run `devpool login <username>` first");
    }
    Ok(())
}

/// Refresh the snapshot, settling terminal outcomes first and turning
/// anything else into a non-fatal notice for the caller.
pub(crate) async fn refresh_or_notice(app: &mut App) -> anyhow::Result<()> {
    if let Err(err) = app.store.refresh().await {
        settle(app).await?;
        anyhow::bail!("could not refresh the inventory: {err}");
    }
    Ok(())
}

pub(crate) fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

pub(crate) fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
