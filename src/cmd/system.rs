use crate::app::App;
use crate::cli::ConfigCommand;
use crate::gate;
use crate::models::SystemStatus;
use crate::workflows::system::{quick_toggle, SystemConfigForm};

use super::{require_session, settle};

pub async fn config(app: &mut App, command: ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            let status = match app.store.fetch_system_status().await {
                Ok(status) => status,
                Err(err) => {
                    settle(app).await?;
                    anyhow::bail!("could not fetch the system status: {err}");
                }
            };
            print_status(&status);
        }

        ConfigCommand::Toggle => {
            require_session(app)?;
            match quick_toggle(&app.api, &app.store).await {
                Ok(status) => {
                    println!(
                        "test mode is now {}",
                        if status.is_test_mode { "on" } else { "off" }
                    );
                    print_status(&status);
                }
                Err(err) => {
                    settle(app).await?;
                    anyhow::bail!("test mode not toggled: {err}");
                }
            }
        }

        ConfigCommand::Set {
            on,
            off,
            message,
            test_type,
            start,
            end,
        } => {
            require_session(app)?;

            // edits start from the last-fetched configuration
            let current = match app.store.fetch_system_status().await {
                Ok(status) => status,
                Err(err) => {
                    settle(app).await?;
                    anyhow::bail!("could not fetch the system status: {err}");
                }
            };

            let mut form = SystemConfigForm::from_status(&current);
            if on {
                form.is_test_mode = true;
            }
            if off {
                form.is_test_mode = false;
            }
            if let Some(message) = message {
                form.test_message = message;
            }
            if let Some(test_type) = test_type {
                form.test_type = test_type;
            }
            if let Some(start) = start {
                form.test_start_date = Some(start);
            }
            if let Some(end) = end {
                form.test_end_date = Some(end);
            }

            match form.submit(&app.api, &app.store).await {
                Ok(status) => {
                    println!("configuration updated");
                    print_status(&status);
                }
                Err(err) => {
                    settle(app).await?;
                    if let Some(message) = &form.errors.test_message {
                        println!("message: {message}");
                    }
                    if let Some(message) = &form.errors.test_end_date {
                        println!("end date: {message}");
                    }
                    if let Some(message) = &form.errors.general {
                        println!("{message}");
                    }
                    anyhow::bail!("configuration not saved: {err}");
                }
            }
        }
    }

    settle(app).await
}

fn print_status(status: &SystemStatus) {
    if status.is_test_mode {
        let kind = status.test_type.as_deref().unwrap_or("test mode");
        println!("system: {kind} in progress");
        if let Some(message) = &status.test_message {
            println!("notice: {message}");
        }
        match (status.test_start_date, status.test_end_date) {
            (Some(start), Some(end)) => println!("window: {start} .. {end}"),
            (Some(start), None) => println!("window: from {start}"),
            (None, Some(end)) => println!("window: until {end}"),
            (None, None) => {}
        }
    } else {
        println!("system: operating normally");
    }
    println!(
        "new rentals: {}",
        if gate::rental_allowed(status) {
            "allowed"
        } else {
            "suspended (returns unaffected)"
        }
    );
}
