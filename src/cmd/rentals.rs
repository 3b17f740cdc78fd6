use crate::app::App;
use crate::models::{Rental, RentalStatus};
use crate::store::{search_rentals, RentalScope};

use super::settle;

pub async fn rentals(
    app: &mut App,
    active: bool,
    returned: bool,
    search: Option<String>,
) -> anyhow::Result<()> {
    let scope = if active {
        RentalScope::Active
    } else if returned {
        RentalScope::Returned
    } else {
        RentalScope::All
    };

    let result = app.store.fetch_rentals(scope).await;
    let mut rentals = match result {
        Ok(rentals) => rentals,
        Err(err) => {
            settle(app).await?;
            anyhow::bail!("could not fetch the rental history: {err}");
        }
    };

    if let Some(query) = search {
        rentals = search_rentals(&rentals, &query);
    }

    for rental in &rentals {
        print_rental(rental);
    }
    println!("{} rentals", rentals.len());

    settle(app).await
}

fn print_rental(rental: &Rental) {
    let returned = match rental.returned_at {
        Some(at) => at.to_rfc3339(),
        None => "-".to_owned(),
    };
    let duration = match rental.duration() {
        Some(duration) => {
            let hours = duration.num_minutes() as f64 / 60.0;
            format!("{hours:.1}h")
        }
        None => "in progress".to_owned(),
    };
    let status = match rental.status {
        RentalStatus::Active => "active",
        RentalStatus::Returned => "returned",
    };

    println!(
        "{:>4}  {:<16} {:<10} {:<8} {:<26} {:<26} {:<12} {}",
        rental.id,
        rental.renter_name,
        rental.device.device_number,
        rental.device.platform.to_string(),
        rental.rented_at.to_rfc3339(),
        returned,
        duration,
        status,
    );
}
