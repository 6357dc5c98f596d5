// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{from_millis, to_millis, Database};
use crate::sensors::{EventType, SensorEvent};

/// Default page size for recent event listings
pub const DEFAULT_EVENT_LIMIT: usize = 100;

const EVENT_COLUMNS: &str = "id, device_id, event_type, people_count, timestamp";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<SensorEvent> {
    Ok(SensorEvent {
        id: row.get(0)?,
        device_id: row.get(1)?,
        event_type: row.get(2)?,
        people_count: row.get(3)?,
        timestamp: from_millis(row.get(4)?),
    })
}

impl Database {
    /// Append an event, returning its id
    pub fn insert_event(&self, event: &SensorEvent) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sensor_events (device_id, event_type, people_count, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                event.device_id,
                event.event_type,
                event.people_count,
                to_millis(event.timestamp),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(
            "Stored {} x{} for device {} as event {}",
            event.event_type, event.people_count, event.device_id, id
        );
        Ok(id)
    }

    /// Append several events in one transaction
    pub fn insert_events(&self, events: &[SensorEvent]) -> Result<usize> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;

        for event in events {
            tx.execute(
                "INSERT INTO sensor_events (device_id, event_type, people_count, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    event.device_id,
                    event.event_type,
                    event.people_count,
                    to_millis(event.timestamp),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// Most recent events of a device, newest first
    pub fn recent_events(&self, device_id: i64, limit: usize) -> Result<Vec<SensorEvent>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sensor_events WHERE device_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
            EVENT_COLUMNS
        ))?;
        let events = stmt
            .query_map(params![device_id, limit as i64], event_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// Events of a device within `[start, end]`, oldest first
    pub fn events_in_range(
        &self,
        device_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SensorEvent>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sensor_events
             WHERE device_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp ASC, id ASC",
            EVENT_COLUMNS
        ))?;
        let events = stmt
            .query_map(params![device_id, to_millis(start), to_millis(end)], event_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    pub fn latest_event(&self, device_id: i64) -> Result<Option<SensorEvent>> {
        let conn = self.conn.lock();
        let event = conn
            .query_row(
                &format!(
                    "SELECT {} FROM sensor_events WHERE device_id = ?1
                     ORDER BY timestamp DESC, id DESC LIMIT 1",
                    EVENT_COLUMNS
                ),
                params![device_id],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    fn sum_people(&self, device_id: i64, event_type: EventType) -> Result<u32> {
        let conn = self.conn.lock();
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(people_count), 0) FROM sensor_events
             WHERE device_id = ?1 AND event_type = ?2",
            params![device_id, event_type],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(total)?)
    }

    /// Everyone who ever entered through this device
    pub fn total_entered(&self, device_id: i64) -> Result<u32> {
        self.sum_people(device_id, EventType::Entry)
    }

    /// Everyone who ever left through this device
    pub fn total_left(&self, device_id: i64) -> Result<u32> {
        self.sum_people(device_id, EventType::Exit)
    }

    /// Entered minus left, floored at zero
    pub fn current_occupancy(&self, device_id: i64) -> Result<u32> {
        let entered = self.total_entered(device_id)?;
        let left = self.total_left(device_id)?;
        Ok(entered.saturating_sub(left))
    }

    pub fn event_count(&self, device_id: i64) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sensor_events WHERE device_id = ?1",
            params![device_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// People who entered through this device at or after `since`
    pub fn entries_since(&self, device_id: i64, since: DateTime<Utc>) -> Result<u32> {
        let conn = self.conn.lock();
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(people_count), 0) FROM sensor_events
             WHERE device_id = ?1 AND event_type = ?2 AND timestamp >= ?3",
            params![device_id, EventType::Entry, to_millis(since)],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(total)?)
    }

    /// Wipe the history of one device
    pub fn delete_events_for_device(&self, device_id: i64) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM sensor_events WHERE device_id = ?1",
            params![device_id],
        )?;

        let remaining: i64 =
            conn.query_row("SELECT COUNT(*) FROM sensor_events", [], |row| row.get(0))?;
        if remaining == 0 {
            Self::reset_sequence(&conn, "sensor_events")?;
        }

        Ok(deleted)
    }

    pub fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM sensor_events WHERE timestamp < ?1",
            params![to_millis(cutoff)],
        )?;
        Ok(deleted)
    }
}
