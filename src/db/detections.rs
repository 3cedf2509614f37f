use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{from_epoch, to_epoch, DbError, SpawnDb};
use crate::spawnpoint::{Observation, SpawnLocation};

impl SpawnDb {
    // =========================================================================
    // Detections
    // =========================================================================

    /// Record one sighting of `location`.
    pub fn insert_detection(
        &self,
        location: &SpawnLocation,
        observation: &Observation,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO spawnpoint_detections
                (encounter_id, spawnpoint_id, latitude, longitude, scan_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                observation.encounter_id,
                location.id,
                location.latitude,
                location.longitude,
                to_epoch(&observation.scan_time),
            ],
        )?;
        Ok(())
    }

    /// Sightings of `spawnpoint_id` strictly after `since` (all of them when
    /// `since` is `None`), oldest first. Rows sharing a timestamp keep their
    /// insertion order.
    pub fn get_detections_since(
        &self,
        spawnpoint_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT encounter_id, scan_time
             FROM spawnpoint_detections
             WHERE spawnpoint_id = ?1 AND scan_time > ?2
             ORDER BY scan_time, id",
        )?;
        let floor = since.as_ref().map(to_epoch).unwrap_or(i64::MIN);
        let rows = stmt.query_map(params![spawnpoint_id, floor], |row| {
            Ok(Observation {
                encounter_id: row.get(0)?,
                scan_time: from_epoch(1, row.get(1)?)?,
            })
        })?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row?);
        }
        Ok(observations)
    }

    /// Points with sightings not yet folded into their record, including
    /// points that have no record at all. Coordinates come from the newest
    /// sighting.
    pub fn pending_locations(&self) -> Result<Vec<SpawnLocation>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT d.spawnpoint_id, d.latitude, d.longitude, MAX(d.id)
             FROM spawnpoint_detections d
             LEFT JOIN spawnpoints s ON s.id = d.spawnpoint_id
             WHERE s.last_scanned IS NULL OR d.scan_time > s.last_scanned
             GROUP BY d.spawnpoint_id
             ORDER BY d.spawnpoint_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SpawnLocation {
                id: row.get(0)?,
                latitude: row.get(1)?,
                longitude: row.get(2)?,
            })
        })?;

        let mut locations = Vec::new();
        for row in rows {
            locations.push(row?);
        }
        Ok(locations)
    }
}
