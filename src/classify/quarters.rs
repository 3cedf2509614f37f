//! Evidence → per-quarter proposal.
//!
//! Quarters are counted backwards from the disappearance edge: the last
//! symbol of `kind` is the quarter that ends where the point vanishes, so a
//! 15-minute spawn is `hhhs` wherever in the hour it happens to sit.

use super::gaps::BoundaryEvidence;
use crate::spawnpoint::{Kind, Links};
use crate::timefold::{quarter_of, QUARTER_SECS};

/// What one batch of sightings says about the point, before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterProposal {
    pub kind: Kind,
    pub links: Links,
    pub evidence: BoundaryEvidence,
}

impl QuarterProposal {
    /// Absolute quarter (0..4) holding the start of the seen stretch.
    pub fn unseen_quarter(&self) -> usize {
        quarter_of(self.evidence.earliest_unseen)
    }

    /// Absolute quarter (0..4) holding the last confirmed sighting.
    pub fn seen_quarter(&self) -> usize {
        quarter_of(self.evidence.latest_seen)
    }
}

/// Classify `evidence`. `double_presence` comes from the folded silence scan
/// and overrides the span-based reading, except when the seen stretch already
/// covers every quarter.
pub fn propose(evidence: BoundaryEvidence, double_presence: bool) -> QuarterProposal {
    let (kind, links) = if double_presence && evidence.seen_span() < 3 * QUARTER_SECS {
        (Kind::DOUBLE, Links::for_kind(&Kind::DOUBLE))
    } else {
        // Round the seen stretch up to whole quarters.
        let present = (evidence.seen_span() / QUARTER_SECS) as usize + 1;
        let kind = Kind::with_present_quarters(present);
        if kind.is_full() {
            (kind, Links::FULL)
        } else {
            (kind, Links::for_kind(&kind))
        }
    };

    QuarterProposal {
        kind,
        links,
        evidence,
    }
}
