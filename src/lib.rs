//! Spawn point activity classification.
//!
//! Infers the hourly presence pattern of fixed spawn points from sparse,
//! timestamped sightings and keeps the result in a SQLite store. Supporting
//! modules persist detections and look up scan-location altitudes.

pub mod altitude;
pub mod classify;
pub mod db;
pub mod error;
mod migrations;
pub mod rounds;
pub mod spawnpoint;
pub mod timefold;
pub mod types;

pub use classify::{classify, classify_sorted, Classification};
pub use error::ClassifyError;
pub use spawnpoint::{Kind, Links, Observation, SpawnLocation, SpawnPoint};
