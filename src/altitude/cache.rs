//! SQLite cache of looked-up altitudes, keyed by a rounded location cell.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DbError;

/// How far away a cached altitude may be and still be reused.
pub const NEARBY_RADIUS_M: f64 = 140.0;

const METRES_PER_DEGREE: f64 = 111_320.0;
/// Cells are 1/1000 of a degree on each axis.
const CELL_SCALE: f64 = 1000.0;

/// Cache key for the cell holding `(lat, lng)`.
pub fn cell_id(lat: f64, lng: f64) -> String {
    format!(
        "{}:{}",
        (lat * CELL_SCALE).round() as i64,
        (lng * CELL_SCALE).round() as i64
    )
}

/// Nearest cached altitude within [`NEARBY_RADIUS_M`] of `(lat, lng)`.
pub fn get_nearby_altitude(conn: &Connection, lat: f64, lng: f64) -> Result<Option<f64>, DbError> {
    let d_lat = NEARBY_RADIUS_M / METRES_PER_DEGREE;
    // Longitude degrees shrink towards the poles.
    let d_lng = d_lat / lat.to_radians().cos().abs().max(0.01);

    let altitude = conn
        .query_row(
            "SELECT altitude FROM location_altitudes
             WHERE latitude BETWEEN ?1 AND ?2 AND longitude BETWEEN ?3 AND ?4
             ORDER BY (latitude - ?5) * (latitude - ?5) + (longitude - ?6) * (longitude - ?6)
             LIMIT 1",
            params![lat - d_lat, lat + d_lat, lng - d_lng, lng + d_lng, lat, lng],
            |row| row.get(0),
        )
        .optional()?;
    Ok(altitude)
}

/// Insert or refresh the altitude for the cell holding `(lat, lng)`.
pub fn save_altitude(conn: &Connection, lat: f64, lng: f64, altitude: f64) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO location_altitudes (cellid, latitude, longitude, altitude, last_modified)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(cellid) DO UPDATE SET
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            altitude = excluded.altitude,
            last_modified = excluded.last_modified",
        params![cell_id(lat, lng), lat, lng, altitude],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;

    #[test]
    fn test_nearby_hit_and_far_miss() {
        let db = test_db();
        let conn = db.conn_ref();
        save_altitude(conn, 40.7128, -74.0060, 10.5).unwrap();

        // ~50 m north.
        assert_eq!(get_nearby_altitude(conn, 40.71325, -74.0060).unwrap(), Some(10.5));
        // ~1 km north.
        assert_eq!(get_nearby_altitude(conn, 40.7218, -74.0060).unwrap(), None);
    }

    #[test]
    fn test_nearest_entry_wins() {
        let db = test_db();
        let conn = db.conn_ref();
        save_altitude(conn, 40.7120, -74.0060, 1.0).unwrap();
        save_altitude(conn, 40.7130, -74.0060, 2.0).unwrap();
        assert_eq!(get_nearby_altitude(conn, 40.71295, -74.0060).unwrap(), Some(2.0));
    }

    #[test]
    fn test_same_cell_overwrites() {
        let db = test_db();
        let conn = db.conn_ref();
        save_altitude(conn, 40.71280, -74.00600, 1.0).unwrap();
        save_altitude(conn, 40.71281, -74.00601, 3.0).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM location_altitudes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(get_nearby_altitude(conn, 40.7128, -74.0060).unwrap(), Some(3.0));
    }
}
