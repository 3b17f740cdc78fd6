/*
Default long-running mode: keep the snapshot fresh and re-render a
summary on a fixed cadence until interrupted. The status poller runs in
the background for the lifetime of the session; this loop only drives
the device/rental refresh and the display.
*/

use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::app::App;
use crate::gate;
use crate::remote::request::Interception;

use super::require_session;

pub async fn console(app: &mut App) -> anyhow::Result<()> {
    require_session(app)?;

    let mut ticker = tokio::time::interval(app.config.status_poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = app.store.refresh().await {
                    // non-fatal unless the transport intercepted it
                    warn!("refresh failed: {err}");
                }

                match app.process_interceptions().await {
                    Some(Interception::AccessDenied) => {
                        anyhow::bail!(
                            "access denied: this network address is not allowed to use the system"
                        );
                    }
                    Some(Interception::SessionExpired) => {
                        println!("the session has expired, log in again");
                        return Ok(());
                    }
                    None => {}
                }

                render(app).await;
            }

            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
        }
    }
}

async fn render(app: &App) {
    if app.store.is_loading().await {
        println!("loading...");
        return;
    }

    let counts = app.store.device_counts().await;
    let snapshot = app.store.snapshot().await;

    println!(
        "---{}",
        if app.store.is_refreshing().await {
            " (refreshing)"
        } else {
            ""
        }
    );
    println!(
        "devices: {} total, {} available, {} rented",
        counts.total, counts.available, counts.rented
    );
    if let Some(stats) = snapshot.stats {
        println!(
            "rentals: {} total, {} active, {} returned",
            stats.total_rentals, stats.active_rentals, stats.returned_rentals
        );
    }
    match snapshot.system_status {
        Some(status) if status.is_test_mode => {
            let kind = status.test_type.as_deref().unwrap_or("test mode");
            let notice = status.test_message.as_deref().unwrap_or("");
            println!("system: {kind} in progress {notice}");
            println!(
                "new rentals: {}",
                if gate::rental_allowed(&status) {
                    "allowed"
                } else {
                    "suspended (returns unaffected)"
                }
            );
        }
        Some(_) => println!("system: operating normally"),
        None => println!("system: status not yet known"),
    }
}
