/*
Availability gating for the rental path.

Whether new rentals are allowed is derived from the cached system status,
never stored. The gate only ever applies to opening new rentals: returning
a rented device is always permitted, and administrator mutations (device
CRUD, system configuration) bypass the gate entirely.
*/

use crate::models::SystemStatus;

/// Whether new rentals are currently permitted.
pub fn rental_allowed(status: &SystemStatus) -> bool {
    !status.is_test_mode
}
