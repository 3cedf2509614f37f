//! Spawn point classification: sightings in, refined record out.
//!
//! Pipeline: [`grouping`] splits the log into encounter runs, [`gaps`] picks
//! the best-bounded transition, [`quarters`] turns it into a per-quarter
//! proposal, and [`merge`] folds that into the stored record without ever
//! loosening what the record already knew. Everything here is pure and
//! synchronous; storage and locking live in `rounds`.

pub mod gaps;
pub mod grouping;
pub mod merge;
pub mod quarters;

use crate::error::ClassifyError;
use crate::spawnpoint::{Observation, SpawnPoint};

pub use gaps::BoundaryEvidence;
pub use grouping::ObservationLog;
pub use quarters::QuarterProposal;

/// Result of classifying one batch against one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The record to persist.
    pub record: SpawnPoint,
    /// The batch's own reading, `None` when the batch was empty.
    pub proposal: Option<QuarterProposal>,
}

impl Classification {
    /// True when the round refined the record rather than counting a miss.
    pub fn refined(&self) -> bool {
        self.record.missed_count == 0 && self.proposal.is_some()
    }
}

/// Classify a validated log against `record`.
///
/// An empty log is not an error: the record comes back unchanged apart from
/// one more miss.
pub fn classify(record: &SpawnPoint, log: &ObservationLog) -> Classification {
    let runs = grouping::group_runs(log);
    let (Some(evidence), Some(last_scan)) = (gaps::analyze(log, &runs), log.last_scan_time())
    else {
        log::debug!("classify: {} has no new sightings", record.id);
        return Classification {
            record: merge::record_miss(record),
            proposal: None,
        };
    };

    let proposal = quarters::propose(evidence, gaps::has_double_presence(log, &evidence));
    let next = merge::merge(record, &proposal, last_scan);

    if next.missed_count == 0 {
        log::info!(
            "classify: {} {}/{} -> {}/{} (seen {}, unseen {}, quarters {}..{}, {} runs)",
            record.id,
            record.kind,
            record.links,
            next.kind,
            next.links,
            next.latest_seen,
            next.earliest_unseen,
            proposal.unseen_quarter(),
            proposal.seen_quarter(),
            runs.len(),
        );
    } else {
        log::debug!(
            "classify: {} unchanged at {}/{} (missed {})",
            record.id,
            next.kind,
            next.links,
            next.missed_count
        );
    }

    Classification {
        record: next,
        proposal: Some(proposal),
    }
}

/// Classify a raw batch that must already be sorted by scan time.
pub fn classify_sorted(
    record: &SpawnPoint,
    observations: Vec<Observation>,
) -> Result<Classification, ClassifyError> {
    let log = ObservationLog::from_sorted(observations)?;
    Ok(classify(record, &log))
}
