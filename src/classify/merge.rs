//! Monotonic merge of a quarter proposal into a stored record.
//!
//! Each slot is a small state machine:
//! - quarter: `Hidden → Static`, never back
//! - boundary: `Unknown → Confirmed(h | + | -)`, never back to `Unknown`
//!
//! A confirmed boundary can switch to another confirmed value, but only when
//! the proposal is at least as strong for that quarter.

use chrono::{DateTime, Utc};

use super::quarters::QuarterProposal;
use crate::spawnpoint::{Boundary, Quarter, SpawnPoint, QUARTERS};
use crate::timefold::CYCLE_SECS;

/// Assumed lead from a known sighting to the next unseen instant while only
/// one edge of the window is known.
pub const UNSEEN_LEAD_SECS: u32 = 14 * 60;

/// Merge one quarter slot.
pub fn merge_slot(old: (Quarter, Boundary), new: (Quarter, Boundary)) -> (Quarter, Boundary) {
    let (old_q, old_b) = old;
    let (new_q, new_b) = new;
    let quarter = old_q.max(new_q);
    let boundary = match (old_b, new_b) {
        (_, Boundary::Unknown) => old_b,
        (Boundary::Unknown, confirmed) => confirmed,
        (_, confirmed) if new_q >= old_q => confirmed,
        _ => old_b,
    };
    (quarter, boundary)
}

/// Fold `proposal` into `old`, producing the next record.
///
/// Bounds move only when the merged kind matches the proposal, i.e. when the
/// new evidence is at least as strong as what the record already knew.
pub fn merge(old: &SpawnPoint, proposal: &QuarterProposal, last_scan: DateTime<Utc>) -> SpawnPoint {
    let mut next = old.clone();
    for i in 0..QUARTERS {
        let (q, b) = merge_slot(
            (old.kind.0[i], old.links.0[i]),
            (proposal.kind.0[i], proposal.links.0[i]),
        );
        next.kind.0[i] = q;
        next.links.0[i] = b;
    }

    if next.kind == proposal.kind {
        let ev = &proposal.evidence;
        next.latest_seen = ev.latest_seen % CYCLE_SECS;
        if next.kind.is_full() {
            next.earliest_unseen = ev.earliest_unseen % CYCLE_SECS;
        } else if next.kind != old.kind {
            next.earliest_unseen = (next.latest_seen + UNSEEN_LEAD_SECS) % CYCLE_SECS;
        } else if old.has_placeholder_bound() {
            next.earliest_unseen = (ev.earliest_unseen + UNSEEN_LEAD_SECS) % CYCLE_SECS;
        }
    }

    next.last_scanned = Some(match old.last_scanned {
        Some(prev) if prev > last_scan => prev,
        _ => last_scan,
    });

    if classification_changed(old, &next) {
        next.missed_count = 0;
    } else {
        next.missed_count = old.missed_count.saturating_add(1);
    }
    next
}

/// Record for a round that brought no sightings.
pub fn record_miss(old: &SpawnPoint) -> SpawnPoint {
    let mut next = old.clone();
    next.missed_count = old.missed_count.saturating_add(1);
    next
}

fn classification_changed(old: &SpawnPoint, new: &SpawnPoint) -> bool {
    old.kind != new.kind
        || old.links != new.links
        || old.latest_seen != new.latest_seen
        || old.earliest_unseen != new.earliest_unseen
}
