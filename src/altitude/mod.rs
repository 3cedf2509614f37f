//! Altitude lookup for scan locations.
//!
//! Lookups go through the persisted `location_altitudes` cache, then the
//! Google Elevation API, then the configured default. Every answer gets a
//! little random jitter so repeated requests from one spot don't report an
//! identical altitude.

pub mod cache;
pub mod client;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand_distr::{Distribution, StandardUniform, Uniform};
use tokio::sync::OnceCell;

use crate::db::SpawnDb;
use crate::types::AltitudeConfig;

pub use client::GmapsElevationClient;

/// Errors from an elevation lookup. Never escapes [`AltitudeService`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AltitudeError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed elevation response: {0}")]
    MalformedResponse(String),
    #[error("Elevation request denied: {status}")]
    Denied { status: String },
}

/// Something that can answer "how high is this point?".
#[async_trait]
pub trait ElevationSource: Send + Sync {
    async fn elevation(&self, lat: f64, lng: f64) -> Result<f64, AltitudeError>;
}

/// Add `[-variance, variance)` whole metres (when variance > 0) plus a
/// `[0, 1)` fraction to `altitude`.
pub fn randomize_altitude(altitude: f64, variance: i64) -> f64 {
    let mut rng = rand::rng();
    let mut jittered = altitude;
    if variance > 0 {
        if let Ok(whole) = Uniform::new(-variance, variance) {
            jittered += whole.sample(&mut rng) as f64;
        }
    }
    let fraction: f64 = StandardUniform.sample(&mut rng);
    jittered + fraction
}

/// Process-wide altitude for runs that skip the persisted cache.
///
/// Concurrent first callers share one lookup. Only a successful lookup is
/// kept; after a failure the next caller tries again.
#[derive(Default)]
pub struct FallbackAltitude {
    cell: OnceCell<f64>,
}

impl FallbackAltitude {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<f64> {
        self.cell.get().copied()
    }

    pub async fn get_or_fetch(
        &self,
        source: &dyn ElevationSource,
        lat: f64,
        lng: f64,
    ) -> Result<f64, AltitudeError> {
        self.cell
            .get_or_try_init(|| source.elevation(lat, lng))
            .await
            .copied()
    }
}

pub struct AltitudeService {
    config: AltitudeConfig,
    source: Arc<dyn ElevationSource>,
    db: Option<Arc<Mutex<SpawnDb>>>,
    fallback: FallbackAltitude,
}

impl AltitudeService {
    pub fn new(
        config: AltitudeConfig,
        source: Arc<dyn ElevationSource>,
        db: Option<Arc<Mutex<SpawnDb>>>,
    ) -> Self {
        Self {
            config,
            source,
            db,
            fallback: FallbackAltitude::new(),
        }
    }

    /// Altitude for `(lat, lng)`, jittered. Always answers: falls back to the
    /// configured default when no lookup succeeds.
    pub async fn get_altitude(&self, lat: f64, lng: f64) -> f64 {
        let altitude = self
            .lookup(lat, lng)
            .await
            .unwrap_or(self.config.default_altitude);
        randomize_altitude(altitude, self.config.variance)
    }

    /// Un-jittered altitude, `None` when neither cache nor API has one.
    pub async fn lookup(&self, lat: f64, lng: f64) -> Option<f64> {
        if self.config.no_db_cache {
            return match self.fallback.get_or_fetch(self.source.as_ref(), lat, lng).await {
                Ok(altitude) => Some(altitude),
                Err(e) => {
                    log_lookup_failure(lat, lng, &e);
                    None
                }
            };
        }

        if let Some(altitude) = self.cached(lat, lng) {
            return Some(altitude);
        }

        match self.source.elevation(lat, lng).await {
            Ok(altitude) => {
                self.store(lat, lng, altitude);
                Some(altitude)
            }
            Err(e) => {
                log_lookup_failure(lat, lng, &e);
                None
            }
        }
    }

    fn cached(&self, lat: f64, lng: f64) -> Option<f64> {
        let db = self.db.as_ref()?;
        let guard = db.lock();
        match cache::get_nearby_altitude(guard.conn_ref(), lat, lng) {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("Altitude cache read failed at {},{}: {}", lat, lng, e);
                None
            }
        }
    }

    fn store(&self, lat: f64, lng: f64, altitude: f64) {
        let Some(db) = self.db.as_ref() else {
            return;
        };
        let guard = db.lock();
        if let Err(e) = cache::save_altitude(guard.conn_ref(), lat, lng, altitude) {
            log::warn!("Altitude cache write failed at {},{}: {}", lat, lng, e);
        }
    }
}

fn log_lookup_failure(lat: f64, lng: f64, err: &AltitudeError) {
    match err {
        AltitudeError::Network(e) => {
            log::warn!("Altitude lookup at {},{} failed to reach the API: {}", lat, lng, e)
        }
        AltitudeError::MalformedResponse(e) => {
            log::warn!("Altitude lookup at {},{} got an unreadable answer: {}", lat, lng, e)
        }
        AltitudeError::Denied { status } => log::warn!(
            "Altitude lookup at {},{} denied ({}); check gmapsKey and quota",
            lat,
            lng,
            status
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers `altitude` after a short delay, failing the first `fail_first` calls.
    struct StubSource {
        altitude: f64,
        fail_first: usize,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(altitude: f64, fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                altitude,
                fail_first,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ElevationSource for StubSource {
        async fn elevation(&self, _lat: f64, _lng: f64) -> Result<f64, AltitudeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if n < self.fail_first {
                Err(AltitudeError::Network("connection refused".into()))
            } else {
                Ok(self.altitude)
            }
        }
    }

    fn config(no_db_cache: bool) -> AltitudeConfig {
        AltitudeConfig {
            no_db_cache,
            variance: 0,
            default_altitude: 507.9,
            ..AltitudeConfig::default()
        }
    }

    #[test]
    fn test_randomize_stays_in_range() {
        for _ in 0..200 {
            let v = randomize_altitude(100.0, 2);
            assert!((98.0..102.0).contains(&v), "{}", v);
            let z = randomize_altitude(100.0, 0);
            assert!((100.0..101.0).contains(&z), "{}", z);
        }
    }

    #[tokio::test]
    async fn test_fallback_is_single_flight() {
        let source = StubSource::new(42.0, 0);
        let fallback = FallbackAltitude::new();
        let (a, b, c) = tokio::join!(
            fallback.get_or_fetch(source.as_ref(), 1.0, 1.0),
            fallback.get_or_fetch(source.as_ref(), 2.0, 2.0),
            fallback.get_or_fetch(source.as_ref(), 3.0, 3.0),
        );
        assert_eq!((a, b, c), (Ok(42.0), Ok(42.0), Ok(42.0)));
        assert_eq!(source.calls(), 1);
        assert_eq!(fallback.get(), Some(42.0));
    }

    #[tokio::test]
    async fn test_fallback_failure_is_not_cached() {
        let source = StubSource::new(42.0, 1);
        let fallback = FallbackAltitude::new();
        assert!(fallback.get_or_fetch(source.as_ref(), 1.0, 1.0).await.is_err());
        assert_eq!(fallback.get(), None);
        assert_eq!(fallback.get_or_fetch(source.as_ref(), 1.0, 1.0).await, Ok(42.0));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_db_cache_is_filled_then_reused() {
        let source = StubSource::new(12.0, 0);
        let db = Arc::new(Mutex::new(test_db()));
        let service = AltitudeService::new(config(false), source.clone(), Some(db.clone()));

        assert_eq!(service.lookup(40.7128, -74.0060).await, Some(12.0));
        assert_eq!(service.lookup(40.7129, -74.0060).await, Some(12.0));
        assert_eq!(source.calls(), 1);

        let cached = cache::get_nearby_altitude(db.lock().conn_ref(), 40.7128, -74.0060).unwrap();
        assert_eq!(cached, Some(12.0));
    }

    #[tokio::test]
    async fn test_no_db_cache_uses_fallback() {
        let source = StubSource::new(12.0, 0);
        let db = Arc::new(Mutex::new(test_db()));
        let service = AltitudeService::new(config(true), source.clone(), Some(db.clone()));

        assert_eq!(service.lookup(1.0, 1.0).await, Some(12.0));
        assert_eq!(service.lookup(50.0, 50.0).await, Some(12.0));
        assert_eq!(source.calls(), 1);
        assert_eq!(cache::get_nearby_altitude(db.lock().conn_ref(), 1.0, 1.0).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_lookup_uses_default() {
        let source = StubSource::new(12.0, usize::MAX);
        let service = AltitudeService::new(config(false), source, None);
        let altitude = service.get_altitude(1.0, 1.0).await;
        assert!((507.9..508.9).contains(&altitude), "{}", altitude);
    }
}
