//! Match lifecycle core for a sports event organizer: live match timing,
//! scoring and finalization over an external record store, and tournament
//! bracket views.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod telemetry;

pub use error::{BracketError, MatchError, StoreError};
