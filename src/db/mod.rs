// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Database module for persistent storage
//!
//! One SQLite file holds users, devices, the append-only event log,
//! cumulative readings and the singleton alert settings row. The typed
//! methods on [`Database`] are the whole repository layer: they delegate
//! straight to SQL with no caching.

mod devices;
mod events;
mod readings;
mod settings;
mod users;

pub use events::DEFAULT_EVENT_LIMIT;
pub use users::User;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseConfig;

/// Database manager
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.path)?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        "#,
        )?;

        let db = Self::from_connection(conn)?;
        info!("Database opened at {:?}", config.path);
        Ok(db)
    }

    /// Fresh in-memory database with the full schema
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Needed on every connection for ON DELETE CASCADE
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.create_tables()?;
        Ok(db)
    }

    /// Create database tables
    fn create_tables(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                device_type TEXT NOT NULL,
                mac_address TEXT NOT NULL,
                capacity INTEGER NOT NULL DEFAULT 100,
                location TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sensor_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
                event_type TEXT NOT NULL,
                people_count INTEGER NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_device ON sensor_events(device_id);
            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON sensor_events(timestamp);

            CREATE TABLE IF NOT EXISTS sensor_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
                entered INTEGER NOT NULL,
                left_count INTEGER NOT NULL,
                capacity INTEGER NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_readings_device ON sensor_readings(device_id);

            CREATE TABLE IF NOT EXISTS alert_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                disconnection_enabled INTEGER NOT NULL,
                low_occupancy_enabled INTEGER NOT NULL,
                low_occupancy_threshold INTEGER NOT NULL,
                high_occupancy_enabled INTEGER NOT NULL,
                high_occupancy_threshold INTEGER NOT NULL,
                traffic_peak_enabled INTEGER NOT NULL,
                traffic_peak_threshold INTEGER NOT NULL
            );
        "#,
        )?;

        Ok(())
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn.lock();

        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        };

        let size_bytes: i64 = conn
            .query_row(
                "SELECT page_count * page_size as size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        Ok(DatabaseStats {
            user_count: count("users")? as usize,
            device_count: count("devices")? as usize,
            event_count: count("sensor_events")? as usize,
            reading_count: count("sensor_readings")? as usize,
            size_bytes: size_bytes as u64,
        })
    }

    /// Delete events and readings older than the retention window
    pub fn cleanup(&self, retention_days: u32) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);

        let deleted_events = self.delete_events_before(cutoff)?;
        let deleted_readings = self.delete_readings_before(cutoff)?;

        info!(
            "Cleaned up {} events and {} readings older than {} days",
            deleted_events, deleted_readings, retention_days
        );

        Ok(deleted_events + deleted_readings)
    }

    /// Reset the autoincrement counter of a table that has been emptied
    fn reset_sequence(conn: &Connection, table: &str) -> Result<()> {
        conn.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![table])?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub user_count: usize,
    pub device_count: usize,
    pub event_count: usize,
    pub reading_count: usize,
    pub size_bytes: u64,
}

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{EventType, NewDevice, SensorEvent};

    #[test]
    fn test_stats_count_rows() {
        let db = Database::open_in_memory().unwrap();
        let device = db
            .insert_device(&NewDevice {
                name: "Entrance".into(),
                ..NewDevice::default()
            })
            .unwrap();
        db.insert_event(&SensorEvent::new(device.id, EventType::Entry, 1)).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.device_count, 1);
        assert_eq!(stats.event_count, 1);
        assert_eq!(stats.reading_count, 0);
        assert_eq!(stats.user_count, 0);
    }

    #[test]
    fn test_cleanup_drops_only_expired_rows() {
        let db = Database::open_in_memory().unwrap();
        let device = db
            .insert_device(&NewDevice {
                name: "Entrance".into(),
                ..NewDevice::default()
            })
            .unwrap();

        let old = Utc::now() - chrono::Duration::days(40);
        db.insert_event(&SensorEvent::new(device.id, EventType::Entry, 1).at(old)).unwrap();
        db.insert_event(&SensorEvent::new(device.id, EventType::Entry, 1)).unwrap();

        assert_eq!(db.cleanup(30).unwrap(), 1);
        assert_eq!(db.event_count(device.id).unwrap(), 1);
    }

    #[test]
    fn test_millis_round_trip() {
        let now = from_millis(to_millis(Utc::now()));
        assert_eq!(from_millis(to_millis(now)), now);
    }

    #[test]
    fn test_file_database_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("footfall-db-{}", uuid::Uuid::new_v4()));
        let config = DatabaseConfig {
            path: dir.join("nested").join("footfall.db"),
            ..DatabaseConfig::default()
        };

        let db = Database::open(&config).unwrap();
        assert!(config.path.exists());
        drop(db);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
