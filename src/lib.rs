//! RFID attendance record service.
//!
//! Card reads are posted to `/dados`, stamped with the server clock and
//! recorded as an entry (`entrada`) or exit (`saida`) depending on the card's
//! previous read.

pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod shutdown;
pub mod store;
pub mod telemetry;
