use crate::app::App;
use crate::gate;
use crate::remote::request::Interception;

use super::{prompt, refresh_or_notice, settle};

pub async fn login(app: &mut App, username: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("password")?,
    };

    match app.session.login(username, &password).await {
        Ok(manager) => {
            app.start_poller();
            println!("logged in as {}", manager.username);
            Ok(())
        }
        Err(err) => {
            // a failed login is reported generically; access denial
            // still takes precedence
            if app.process_interceptions().await == Some(Interception::AccessDenied) {
                anyhow::bail!(
                    "access denied: this network address is not allowed to use the system"
                );
            }
            Err(err.into())
        }
    }
}

pub async fn logout(app: &mut App) -> anyhow::Result<()> {
    app.logout().await;
    println!("logged out");
    Ok(())
}

pub async fn status(app: &mut App) -> anyhow::Result<()> {
    match app.session.manager().await {
        Some(manager) => println!("session: {} (authenticated)", manager.username),
        None => println!("session: unauthenticated"),
    }

    if let Err(err) = app.store.fetch_system_status().await {
        settle(app).await?;
        println!("system status unavailable: {err}");
    }

    if app.session.is_authenticated() {
        refresh_or_notice(app).await?;

        println!(
            "status poll: {}",
            if app.poller_running() { "active" } else { "stopped" }
        );

        let counts = app.store.device_counts().await;
        println!(
            "devices: {} total, {} available, {} rented",
            counts.total, counts.available, counts.rented
        );
        if let Some(stats) = app.store.snapshot().await.stats {
            println!(
                "rentals: {} total, {} active, {} returned",
                stats.total_rentals, stats.active_rentals, stats.returned_rentals
            );
        }
    }

    if let Some(status) = app.store.system_status().await {
        if status.is_test_mode {
            let kind = status.test_type.as_deref().unwrap_or("test mode");
            println!("system: {kind} in progress");
            if let Some(message) = &status.test_message {
                println!("notice: {message}");
            }
            if let (Some(start), Some(end)) = (status.test_start_date, status.test_end_date) {
                println!("window: {start} .. {end}");
            }
        } else {
            println!("system: operating normally");
        }
        println!(
            "new rentals: {}",
            if gate::rental_allowed(&status) {
                "allowed"
            } else {
                "suspended (returns unaffected)"
            }
        );
    }

    settle(app).await
}
