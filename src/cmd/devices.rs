use crate::app::App;
use crate::cli::DeviceCommand;
use crate::models::Device;
use crate::store::filtered_view;
use crate::workflows::device::{DeviceForm, PendingDelete};
use crate::workflows::returns::ReturnForm;
use crate::workflows::WorkflowError;

use super::{confirm, prompt, refresh_or_notice, require_session, settle};

pub async fn devices(app: &mut App, command: DeviceCommand) -> anyhow::Result<()> {
    require_session(app)?;

    match command {
        DeviceCommand::List { status, platform } => {
            refresh_or_notice(app).await?;

            let devices = app.store.devices().await;
            let view = filtered_view(&devices, status.into(), platform.into());
            for device in &view {
                print_device(device);
            }
            println!("{} of {} devices shown", view.len(), devices.len());
        }

        DeviceCommand::Add {
            number,
            product,
            model,
            os,
            platform,
            rooted,
        } => {
            let mut form = DeviceForm::create();
            form.device_number = number;
            form.product_name = product;
            form.model_name = model.unwrap_or_default();
            form.os_version = os;
            form.platform = platform.into();
            form.is_rooted_or_jailbroken = rooted;

            match form.submit(&app.api, &app.store).await {
                Ok(device) => println!("added {}", device.label()),
                Err(err) => return fail_device_form(app, &form, err).await,
            }
        }

        DeviceCommand::Edit {
            id,
            number,
            product,
            model,
            os,
            platform,
            rooted,
        } => {
            refresh_or_notice(app).await?;
            let device = app
                .store
                .device(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("no device with id {id}"))?;

            let mut form = DeviceForm::edit(&device);
            if let Some(number) = number {
                form.device_number = number;
            }
            if let Some(product) = product {
                form.product_name = product;
            }
            if let Some(model) = model {
                form.model_name = model;
            }
            if let Some(os) = os {
                form.os_version = os;
            }
            if let Some(platform) = platform {
                form.platform = platform.into();
            }
            if let Some(rooted) = rooted {
                form.is_rooted_or_jailbroken = rooted;
            }

            match form.submit(&app.api, &app.store).await {
                Ok(device) => println!("updated {}", device.label()),
                Err(err) => return fail_device_form(app, &form, err).await,
            }
        }

        DeviceCommand::Rm { id, yes } => {
            refresh_or_notice(app).await?;
            let device = app
                .store
                .device(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("no device with id {id}"))?;

            // rented devices are refused before any network call
            let pending = PendingDelete::prepare(&device)?;

            if !yes && !confirm(&format!("delete {}?", pending.label()))? {
                println!("aborted");
                return Ok(());
            }

            let label = pending.label().to_owned();
            match pending.execute(&app.api, &app.store).await {
                Ok(()) => println!("deleted {label}"),
                Err(err) => {
                    settle(app).await?;
                    anyhow::bail!("device not deleted: {err}");
                }
            }
        }

        DeviceCommand::Return {
            id,
            renter,
            password,
        } => {
            refresh_or_notice(app).await?;
            let device = app
                .store
                .device(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("no device with id {id}"))?;

            let mut form = ReturnForm::open(&device)?;
            if let Some(current) = &form.current_renter {
                println!("recorded renter: {current}");
            }
            println!("a return cannot be undone once accepted");

            form.renter_name = renter;
            form.password = match password {
                Some(password) => password,
                None => prompt("QA password")?,
            };

            match form.submit(&app.api, &app.store).await {
                Ok(()) => println!("returned {}", form.device_label),
                Err(err) => {
                    settle(app).await?;
                    if let Some(message) = &form.errors.renter_name {
                        println!("renter name: {message}");
                    }
                    if let Some(message) = &form.errors.password {
                        println!("QA password: {message}");
                    }
                    if let Some(message) = &form.errors.general {
                        println!("{message}");
                    }
                    anyhow::bail!("device not returned: {err}");
                }
            }
        }
    }

    settle(app).await
}

async fn fail_device_form(
    app: &mut App,
    form: &DeviceForm,
    err: WorkflowError,
) -> anyhow::Result<()> {
    settle(app).await?;
    if let Some(message) = &form.errors.device_number {
        println!("device number: {message}");
    }
    if let Some(message) = &form.errors.product_name {
        println!("product name: {message}");
    }
    if let Some(message) = &form.errors.os_version {
        println!("OS version: {message}");
    }
    if let Some(message) = &form.errors.general {
        println!("{message}");
    }
    anyhow::bail!("device not saved: {err}");
}

fn print_device(device: &Device) {
    println!(
        "{:>4}  {:<10} {:<24} {:<8} {:<10} {:<10} {}",
        device.id,
        device.device_number,
        device.product_name,
        device.platform.to_string(),
        device.os_version,
        device.status.to_string(),
        device.current_renter.as_deref().unwrap_or("-"),
    );
}
