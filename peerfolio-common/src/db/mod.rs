//! Persistence layer
//!
//! Query functions take `&mut SqliteConnection` so the same code runs against a
//! pooled connection or inside a transaction (`&mut *tx`).

pub mod init;
pub mod migrations;
pub mod models;
pub mod people;
pub mod reports;
pub mod reviews;
pub mod tags;
pub mod users;

pub use init::{init_database, open_in_memory};
pub use models::*;
