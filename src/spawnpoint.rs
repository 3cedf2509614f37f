//! Spawn point record and its per-quarter classification types.
//!
//! A record carries two parallel four-symbol strings:
//! - `kind`: one [`Quarter`] per quarter hour, `h` (hidden) or `s` (static)
//! - `links`: one [`Boundary`] per quarter edge, `h`, `?`, `+` or `-`
//!
//! Both are fixed-size arrays, so the length and alphabet invariants hold by
//! construction; the string forms exist only for storage and display.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timefold::{CYCLE_SECS, QUARTER_SECS};

/// Number of quarters in one cycle.
pub const QUARTERS: usize = 4;

/// Rejected kind/links text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} '{value}': expected 4 symbols from [{alphabet}]")]
pub struct SymbolError {
    pub field: &'static str,
    pub value: String,
    pub alphabet: &'static str,
}

/// Resolution state of one quarter hour. Ordered: `Hidden < Static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    /// An appearance/disappearance edge may still fall inside this quarter.
    Hidden,
    /// Presence (or absence) is settled for the whole quarter.
    Static,
}

impl Quarter {
    pub fn symbol(self) -> char {
        match self {
            Quarter::Hidden => 'h',
            Quarter::Static => 's',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'h' => Some(Quarter::Hidden),
            's' => Some(Quarter::Static),
            _ => None,
        }
    }
}

/// Confidence in the edge that closes a quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// `?`: not determined yet.
    Unknown,
    /// `h`: an observed appearance/disappearance transition.
    Transition,
    /// `+`: presence continues across the edge.
    Bridge,
    /// `-`: the edge closes the located absence window.
    Gap,
}

impl Boundary {
    pub fn symbol(self) -> char {
        match self {
            Boundary::Unknown => '?',
            Boundary::Transition => 'h',
            Boundary::Bridge => '+',
            Boundary::Gap => '-',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '?' => Some(Boundary::Unknown),
            'h' => Some(Boundary::Transition),
            '+' => Some(Boundary::Bridge),
            '-' => Some(Boundary::Gap),
            _ => None,
        }
    }

    pub fn is_confirmed(self) -> bool {
        self != Boundary::Unknown
    }
}

fn parse_symbols<T: Copy>(
    value: &str,
    field: &'static str,
    alphabet: &'static str,
    from_symbol: fn(char) -> Option<T>,
) -> Result<[T; QUARTERS], SymbolError> {
    let err = || SymbolError {
        field,
        value: value.to_string(),
        alphabet,
    };
    let parsed: Vec<T> = value
        .chars()
        .map(|c| from_symbol(c).ok_or_else(err))
        .collect::<Result<_, _>>()?;
    parsed.try_into().map_err(|_| err())
}

/// Per-quarter status string, e.g. `hhhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kind(pub [Quarter; QUARTERS]);

impl Kind {
    /// Initial guess for a new point: a 15-minute spawn.
    pub const DEFAULT: Kind = Kind([
        Quarter::Hidden,
        Quarter::Hidden,
        Quarter::Hidden,
        Quarter::Static,
    ]);

    /// Two separate 15-minute presences per hour.
    pub const DOUBLE: Kind = Kind([
        Quarter::Hidden,
        Quarter::Static,
        Quarter::Hidden,
        Quarter::Static,
    ]);

    /// Present the whole hour apart from one short window.
    pub const FULL: Kind = Kind([Quarter::Static; QUARTERS]);

    /// `present` trailing static quarters, hidden before them (`present` is
    /// clamped to `1..=4`).
    pub fn with_present_quarters(present: usize) -> Self {
        let present = present.clamp(1, QUARTERS);
        let mut quarters = [Quarter::Hidden; QUARTERS];
        for q in quarters.iter_mut().skip(QUARTERS - present) {
            *q = Quarter::Static;
        }
        Kind(quarters)
    }

    pub fn present_quarters(&self) -> usize {
        self.0.iter().filter(|q| **q == Quarter::Static).count()
    }

    pub fn is_full(&self) -> bool {
        *self == Kind::FULL
    }
}

impl Default for Kind {
    fn default() -> Self {
        Kind::DEFAULT
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|q| write!(f, "{}", q.symbol()))
    }
}

impl FromStr for Kind {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_symbols(s, "kind", "hs", Quarter::from_symbol).map(Kind)
    }
}

impl TryFrom<String> for Kind {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        kind.to_string()
    }
}

/// Per-boundary confidence string, e.g. `+++-`.
///
/// Links only ever gain confidence. A `h` next to a quarter that has since
/// turned static is the transition an earlier round saw at that edge; `kind`
/// says where the point is present now, `links` what has been observed at
/// each edge so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Links(pub [Boundary; QUARTERS]);

impl Links {
    pub const UNKNOWN: Links = Links([Boundary::Unknown; QUARTERS]);

    /// Three presence bridges closed by the located absence window.
    pub const FULL: Links = Links([
        Boundary::Bridge,
        Boundary::Bridge,
        Boundary::Bridge,
        Boundary::Gap,
    ]);

    /// Transition edges on hidden quarters, unknown edges on static ones.
    pub fn for_kind(kind: &Kind) -> Self {
        let mut links = [Boundary::Unknown; QUARTERS];
        for (link, quarter) in links.iter_mut().zip(kind.0.iter()) {
            if *quarter == Quarter::Hidden {
                *link = Boundary::Transition;
            }
        }
        Links(links)
    }

    pub fn all_confirmed(&self) -> bool {
        self.0.iter().all(|b| b.is_confirmed())
    }
}

impl Default for Links {
    fn default() -> Self {
        Links::UNKNOWN
    }
}

impl fmt::Display for Links {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{}", b.symbol()))
    }
}

impl FromStr for Links {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_symbols(s, "links", "h?+-", Boundary::from_symbol).map(Links)
    }
}

impl TryFrom<String> for Links {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Links> for String {
    fn from(links: Links) -> Self {
        links.to_string()
    }
}

/// One sighting at a spawn point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Identity token: sightings sharing it belong to one occupancy.
    pub encounter_id: String,
    pub scan_time: DateTime<Utc>,
}

impl Observation {
    pub fn new(encounter_id: impl Into<String>, scan_time: DateTime<Utc>) -> Self {
        Self {
            encounter_id: encounter_id.into(),
            scan_time,
        }
    }
}

/// Where a spawn point sits; enough to create its record on first sight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnLocation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Persisted classification state of one spawn point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnPoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: Kind,
    pub links: Links,
    /// Last second of the cycle the point was confirmed present.
    pub latest_seen: u32,
    /// Second of the cycle the point was next confirmed gone.
    pub earliest_unseen: u32,
    /// Consecutive rounds that left the record unchanged.
    pub missed_count: u32,
    /// Newest sighting folded into this record; `None` until first classified.
    pub last_scanned: Option<DateTime<Utc>>,
}

impl SpawnPoint {
    /// Fresh record for a never-classified point.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        let mut sp = Self {
            id: id.into(),
            latitude,
            longitude,
            kind: Kind::DEFAULT,
            links: Links::UNKNOWN,
            latest_seen: 0,
            earliest_unseen: 0,
            missed_count: 0,
            last_scanned: None,
        };
        sp.set_default_earliest_unseen();
        sp
    }

    pub fn from_location(location: &SpawnLocation) -> Self {
        Self::new(location.id.clone(), location.latitude, location.longitude)
    }

    /// Placeholder unseen bound: one quarter after `latest_seen`.
    pub fn default_earliest_unseen(latest_seen: u32) -> u32 {
        (latest_seen + QUARTER_SECS) % CYCLE_SECS
    }

    pub fn set_default_earliest_unseen(&mut self) {
        self.earliest_unseen = Self::default_earliest_unseen(self.latest_seen);
    }

    /// True while the record still holds the initial placeholder bound and
    /// has never been classified.
    pub fn has_placeholder_bound(&self) -> bool {
        self.last_scanned.is_none()
            && self.earliest_unseen == Self::default_earliest_unseen(self.latest_seen)
    }

    /// Every quarter static and every edge confirmed: nothing left to scan for.
    pub fn is_resolved(&self) -> bool {
        self.kind.is_full() && self.links.all_confirmed()
    }
}
