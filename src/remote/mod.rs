/*
This module is home to everything related to the backend service that
owns the device pool.

It provides the transport with its two request channels and global
response interception, plus the typed endpoint surface the rest of the
client is written against.
*/

pub mod api;
pub mod request;
