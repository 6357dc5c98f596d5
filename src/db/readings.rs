// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{from_millis, to_millis, Database};
use crate::sensors::SensorReading;

const READING_COLUMNS: &str = "id, device_id, entered, left_count, capacity, timestamp";

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<SensorReading> {
    Ok(SensorReading {
        id: row.get(0)?,
        device_id: row.get(1)?,
        entered: row.get(2)?,
        left: row.get(3)?,
        capacity: row.get(4)?,
        timestamp: from_millis(row.get(5)?),
    })
}

impl Database {
    /// Store a counter snapshot
    pub fn insert_reading(&self, reading: &SensorReading) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sensor_readings (device_id, entered, left_count, capacity, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reading.device_id,
                reading.entered,
                reading.left,
                reading.capacity,
                to_millis(reading.timestamp),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn latest_reading(&self, device_id: i64) -> Result<Option<SensorReading>> {
        let conn = self.conn.lock();
        let reading = conn
            .query_row(
                &format!(
                    "SELECT {} FROM sensor_readings WHERE device_id = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT 1",
                    READING_COLUMNS
                ),
                params![device_id],
                reading_from_row,
            )
            .optional()?;
        Ok(reading)
    }

    pub fn recent_readings(&self, device_id: i64, limit: usize) -> Result<Vec<SensorReading>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sensor_readings WHERE device_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
            READING_COLUMNS
        ))?;
        let readings = stmt
            .query_map(params![device_id, limit as i64], reading_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(readings)
    }

    pub fn readings_in_range(
        &self,
        device_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sensor_readings
             WHERE device_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp ASC, id ASC",
            READING_COLUMNS
        ))?;
        let readings = stmt
            .query_map(params![device_id, to_millis(start), to_millis(end)], reading_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(readings)
    }

    pub fn delete_readings_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM sensor_readings WHERE timestamp < ?1",
            params![to_millis(cutoff)],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::NewDevice;
    use chrono::Duration;

    #[test]
    fn test_latest_reading_and_range() {
        let db = Database::open_in_memory().unwrap();
        let device = db
            .insert_device(&NewDevice {
                name: "Door".into(),
                ..NewDevice::default()
            })
            .unwrap();
        let base = Utc::now() - Duration::minutes(30);

        for (i, (entered, left)) in [(0, 0), (4, 1), (9, 3)].into_iter().enumerate() {
            db.insert_reading(&SensorReading {
                id: 0,
                device_id: device.id,
                entered,
                left,
                capacity: device.capacity,
                timestamp: base + Duration::minutes(i as i64 * 10),
            })
            .unwrap();
        }

        let latest = db.latest_reading(device.id).unwrap().unwrap();
        assert_eq!(latest.entered, 9);
        assert_eq!(latest.occupancy(), 6);

        let ranged = db
            .readings_in_range(device.id, base + Duration::minutes(5), Utc::now())
            .unwrap();
        assert_eq!(ranged.len(), 2);
        assert_eq!(db.recent_readings(device.id, 10).unwrap().len(), 3);

        assert_eq!(db.delete_readings_before(base + Duration::minutes(15)).unwrap(), 2);
    }
}
