//! Gap analysis between encounter runs.
//!
//! The real (absolute) gap between one run ending and the next starting says
//! how closely the scanner was watching when the point changed hands. The
//! shortest such gap is the best localization of the point's unseen window;
//! gaps of a full cycle or more are scanner downtime and localize nothing.

use chrono::{DateTime, Utc};

use super::grouping::{ObservationLog, Run};
use crate::timefold::{time_of_cycle, CYCLE_SECS, QUARTER_SECS};

const CYCLE: i64 = CYCLE_SECS as i64;

/// Tightest known bounds on the unseen window, in seconds of cycle.
///
/// `latest_seen` carries a lap offset so that it always lies after
/// `earliest_unseen`: the seen stretch runs forward from `earliest_unseen`,
/// possibly past the hour mark, up to `latest_seen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryEvidence {
    pub earliest_unseen: u32,
    pub latest_seen: u32,
    /// False when no run transition qualified and the bounds are just the
    /// extremes of every sighting.
    pub localized: bool,
    /// Real gap of the selected transition, when one was selected.
    pub gap_secs: Option<i64>,
}

impl BoundaryEvidence {
    fn from_transition(last_seen_at: u32, next_seen_at: u32, gap_secs: i64) -> Self {
        let mut latest_seen = last_seen_at;
        while latest_seen <= next_seen_at {
            latest_seen += CYCLE_SECS;
        }
        Self {
            earliest_unseen: next_seen_at,
            latest_seen,
            localized: true,
            gap_secs: Some(gap_secs),
        }
    }

    /// Length of the seen stretch in seconds.
    pub fn seen_span(&self) -> u32 {
        self.latest_seen - self.earliest_unseen
    }
}

fn real_gap(from: &DateTime<Utc>, to: &DateTime<Utc>) -> i64 {
    (*to - *from).num_seconds()
}

/// Select the best-bounded transition in `runs` (grouped from `log`).
///
/// Returns `None` only for an empty log.
pub fn analyze(log: &ObservationLog, runs: &[Run]) -> Option<BoundaryEvidence> {
    let (first, last) = (runs.first()?, runs.last()?);

    let mut best: Option<(i64, &Run, &Run)> = None;
    let mut shortest_any: Option<i64> = None;
    for pair in runs.windows(2) {
        let gap = real_gap(&pair[0].end, &pair[1].start);
        shortest_any = Some(shortest_any.map_or(gap, |s| s.min(gap)));
        if gap >= CYCLE {
            continue;
        }
        // Strict comparison: the earliest pair wins ties.
        if best.map_or(true, |(g, _, _)| gap < g) {
            best = Some((gap, &pair[0], &pair[1]));
        }
    }

    // Last run to first run, one cycle later.
    let wrap = real_gap(&last.end, &first.start) + CYCLE;
    if (0..CYCLE).contains(&wrap) && shortest_any.map_or(true, |s| wrap < s) {
        best = Some((wrap, last, first));
    }

    if let Some((gap, before, after)) = best {
        let evidence = BoundaryEvidence::from_transition(
            time_of_cycle(&before.end),
            time_of_cycle(&after.start),
            gap,
        );
        log::debug!(
            "gaps: encounter {} -> {} after {}s, unseen {} .. seen {}",
            before.encounter_id,
            after.encounter_id,
            gap,
            evidence.earliest_unseen,
            evidence.latest_seen
        );
        return Some(evidence);
    }

    let folded = log.observations().iter().map(|o| time_of_cycle(&o.scan_time));
    let (min, max) = folded.fold((u32::MAX, 0), |(lo, hi), s| (lo.min(s), hi.max(s)));
    log::debug!("gaps: no localizing transition, using sighting extremes {}..{}", min, max);
    Some(BoundaryEvidence {
        earliest_unseen: min,
        latest_seen: max,
        localized: false,
        gap_secs: None,
    })
}

/// Silences between consecutive sightings once folded onto the cycle,
/// including the wrap from the last position back to the first.
///
/// Each entry is `(start, length)`, with `start` the folded position the
/// silence begins at.
pub fn folded_silences(log: &ObservationLog) -> Vec<(u32, u32)> {
    let mut seen: Vec<u32> = log
        .observations()
        .iter()
        .map(|o| time_of_cycle(&o.scan_time))
        .collect();
    seen.sort_unstable();
    if let Some(first) = seen.first().copied() {
        seen.push(first + CYCLE_SECS);
    }
    seen.windows(2).map(|w| (w[0], w[1] - w[0])).collect()
}

/// True when the point shows up twice an hour.
///
/// Needs a localized transition whose seen stretch is shorter than three
/// quarters, and exactly two folded silences longer than a quarter, one of
/// which is the silence that transition crossed.
pub fn has_double_presence(log: &ObservationLog, evidence: &BoundaryEvidence) -> bool {
    if !evidence.localized || evidence.seen_span() >= 3 * QUARTER_SECS {
        return false;
    }
    let silences = folded_silences(log);
    if silences.len() <= 4 {
        return false;
    }

    let long: Vec<(u32, u32)> = silences
        .into_iter()
        .filter(|&(_, len)| len > QUARTER_SECS)
        .collect();
    if long.len() != 2 {
        return false;
    }

    let transition_start = evidence.latest_seen % CYCLE_SECS;
    long.iter().any(|&(start, len)| {
        start == transition_start && (start + len) % CYCLE_SECS == evidence.earliest_unseen
    })
}
