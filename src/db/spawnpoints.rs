use rusqlite::{params, OptionalExtension};

use super::{from_epoch, to_epoch, DbError, SpawnDb};
use crate::spawnpoint::SpawnPoint;

impl SpawnDb {
    // =========================================================================
    // Spawn point records
    // =========================================================================

    /// Load one record, `None` when the point has never been classified.
    pub fn get_spawnpoint(&self, id: &str) -> Result<Option<SpawnPoint>, DbError> {
        let point = self
            .conn
            .query_row(
                "SELECT id, latitude, longitude, kind, links, latest_seen, earliest_unseen,
                        missed_count, last_scanned
                 FROM spawnpoints WHERE id = ?1",
                params![id],
                Self::map_spawnpoint_row,
            )
            .optional()?;
        Ok(point)
    }

    /// Insert or replace a record.
    pub fn upsert_spawnpoint(&self, point: &SpawnPoint) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO spawnpoints (id, latitude, longitude, kind, links, latest_seen,
                                      earliest_unseen, missed_count, last_scanned, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                kind = excluded.kind,
                links = excluded.links,
                latest_seen = excluded.latest_seen,
                earliest_unseen = excluded.earliest_unseen,
                missed_count = excluded.missed_count,
                last_scanned = excluded.last_scanned,
                updated_at = excluded.updated_at",
            params![
                point.id,
                point.latitude,
                point.longitude,
                point.kind.to_string(),
                point.links.to_string(),
                point.latest_seen,
                point.earliest_unseen,
                point.missed_count,
                point.last_scanned.as_ref().map(to_epoch),
            ],
        )?;
        Ok(())
    }

    fn map_spawnpoint_row(row: &rusqlite::Row) -> rusqlite::Result<SpawnPoint> {
        let kind: String = row.get(3)?;
        let links: String = row.get(4)?;
        let last_scanned: Option<i64> = row.get(8)?;
        Ok(SpawnPoint {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            kind: kind.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?,
            links: links.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?,
            latest_seen: row.get(5)?,
            earliest_unseen: row.get(6)?,
            missed_count: row.get(7)?,
            last_scanned: last_scanned.map(|s| from_epoch(8, s)).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_db;
    use super::*;
    use crate::spawnpoint::{Kind, Links};
    use chrono::DateTime;

    #[test]
    fn test_missing_spawnpoint_is_none() {
        let db = test_db();
        assert_eq!(db.get_spawnpoint("nope").expect("get"), None);
    }

    #[test]
    fn test_upsert_round_trips_every_field() {
        let db = test_db();
        let mut point = SpawnPoint::new("sp1", 40.7128, -74.006);
        point.kind = Kind::FULL;
        point.links = Links::FULL;
        point.latest_seen = 681;
        point.earliest_unseen = 821;
        point.missed_count = 2;
        point.last_scanned = DateTime::from_timestamp(1_484_157_600, 0);
        db.upsert_spawnpoint(&point).expect("insert");

        assert_eq!(db.get_spawnpoint("sp1").expect("get"), Some(point.clone()));

        point.missed_count = 3;
        db.upsert_spawnpoint(&point).expect("update");
        let stored = db.get_spawnpoint("sp1").expect("get").expect("present");
        assert_eq!(stored.missed_count, 3);
    }

    #[test]
    fn test_corrupt_kind_never_reaches_the_store() {
        let db = test_db();
        let seeded = db.conn_ref().execute(
            "INSERT INTO spawnpoints (id, latitude, longitude, kind) VALUES ('bad', 0, 0, 'hxhs')",
            [],
        );
        assert!(seeded.is_err());
        assert_eq!(db.get_spawnpoint("bad").expect("get"), None);
    }
}
