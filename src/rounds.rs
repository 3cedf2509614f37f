//! Classification rounds: read a point's new sightings, classify, persist.
//!
//! The store and the sighting source are traits so a caller can plug in
//! another backend; [`SpawnDb`] implements both.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use crate::classify::{classify, Classification, ObservationLog};
use crate::db::SpawnDb;
use crate::error::ClassifyError;
use crate::spawnpoint::{Observation, SpawnLocation, SpawnPoint};

/// Persisted spawn point records.
pub trait RecordStore {
    fn get(&self, id: &str) -> Result<Option<SpawnPoint>, String>;
    fn upsert(&self, point: &SpawnPoint) -> Result<(), String>;
}

/// Sightings of a point, oldest first.
pub trait ObservationSource {
    /// Sightings strictly after `since`, or all of them when `since` is `None`.
    fn observations_since(
        &self,
        id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, String>;
}

impl RecordStore for SpawnDb {
    fn get(&self, id: &str) -> Result<Option<SpawnPoint>, String> {
        self.get_spawnpoint(id).map_err(|e| e.to_string())
    }

    fn upsert(&self, point: &SpawnPoint) -> Result<(), String> {
        self.upsert_spawnpoint(point).map_err(|e| e.to_string())
    }
}

impl ObservationSource for SpawnDb {
    fn observations_since(
        &self,
        id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, String> {
        self.get_detections_since(id, since)
            .map_err(|e| e.to_string())
    }
}

/// One mutex per spawn point, created on first use.
#[derive(Default)]
pub struct PointLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PointLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no other round holds `id`.
    pub fn lock(&self, id: &str) -> ArcMutexGuard<RawMutex, ()> {
        // Clone the Arc out so the map shard is released before blocking.
        let lock = self.locks.entry(id.to_string()).or_default().value().clone();
        lock.lock_arc()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

fn store_failure(id: &str, what: &str, err: String) -> ClassifyError {
    log::warn!("round: {} failed to {}: {}", id, what, err);
    ClassifyError::StoreUnavailable(format!("{what} for {id}: {err}"))
}

/// Run one round for `location`.
///
/// Holds the point's lock from read to write. When the store fails the
/// computed record is dropped; retrying is up to the caller.
pub fn run_round<S, O>(
    store: &S,
    source: &O,
    locks: &PointLocks,
    location: &SpawnLocation,
) -> Result<Classification, ClassifyError>
where
    S: RecordStore + ?Sized,
    O: ObservationSource + ?Sized,
{
    let _guard = locks.lock(&location.id);

    let record = store
        .get(&location.id)
        .map_err(|e| store_failure(&location.id, "read record", e))?
        .unwrap_or_else(|| SpawnPoint::from_location(location));

    let observations = source
        .observations_since(&location.id, record.last_scanned)
        .map_err(|e| store_failure(&location.id, "read detections", e))?;
    let log = ObservationLog::sorted(observations);

    let result = classify(&record, &log);
    store
        .upsert(&result.record)
        .map_err(|e| store_failure(&location.id, "write record", e))?;
    Ok(result)
}

/// Tally of one pass over many points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub refined: usize,
    pub missed: usize,
    pub failed: usize,
}

impl RoundSummary {
    pub fn total(&self) -> usize {
        self.refined + self.missed + self.failed
    }
}

/// Run a round for every location in turn. A failed point is counted and
/// skipped; the rest still run.
pub fn run_rounds<S, O>(
    store: &S,
    source: &O,
    locks: &PointLocks,
    locations: &[SpawnLocation],
) -> RoundSummary
where
    S: RecordStore + ?Sized,
    O: ObservationSource + ?Sized,
{
    let mut summary = RoundSummary::default();
    for location in locations {
        match run_round(store, source, locks, location) {
            Ok(result) if result.refined() => summary.refined += 1,
            Ok(_) => summary.missed += 1,
            Err(e) => {
                log::warn!("round: skipping {}: {} ({})", location.id, e, e.recovery_suggestion());
                summary.failed += 1;
            }
        }
    }
    log::info!(
        "round: {} points, {} refined, {} unchanged, {} failed",
        summary.total(),
        summary.refined,
        summary.missed,
        summary.failed
    );
    summary
}
