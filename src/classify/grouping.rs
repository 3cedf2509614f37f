//! Chronological observation logs and their encounter runs.

use chrono::{DateTime, Utc};

use crate::error::ClassifyError;
use crate::spawnpoint::Observation;

/// Observations for one point, guaranteed ascending by scan time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationLog {
    observations: Vec<Observation>,
}

impl ObservationLog {
    /// Accept a log the caller claims is already sorted.
    ///
    /// Rejects the whole log when any sighting precedes the one before it.
    pub fn from_sorted(observations: Vec<Observation>) -> Result<Self, ClassifyError> {
        if let Some(i) = observations
            .windows(2)
            .position(|w| w[1].scan_time < w[0].scan_time)
        {
            return Err(ClassifyError::MalformedInput(format!(
                "sighting {} at {} precedes sighting {} at {}",
                i + 1,
                observations[i + 1].scan_time.to_rfc3339(),
                i,
                observations[i].scan_time.to_rfc3339(),
            )));
        }
        Ok(Self { observations })
    }

    /// Sort an arbitrary batch. Stable, so sightings sharing a timestamp keep
    /// their arrival order.
    pub fn sorted(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.scan_time);
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Newest scan time in the log.
    pub fn last_scan_time(&self) -> Option<DateTime<Utc>> {
        self.observations.last().map(|o| o.scan_time)
    }
}

/// A stretch of consecutive sightings sharing one encounter id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub encounter_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Split the log into runs. A run ends as soon as the encounter id changes,
/// even if the same id shows up again later.
pub fn group_runs(log: &ObservationLog) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for obs in log.observations() {
        match runs.last_mut() {
            Some(run) if run.encounter_id == obs.encounter_id => run.end = obs.scan_time,
            _ => runs.push(Run {
                encounter_id: obs.encounter_id.clone(),
                start: obs.scan_time,
                end: obs.scan_time,
            }),
        }
    }
    runs
}
