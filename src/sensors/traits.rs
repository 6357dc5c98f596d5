// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor traits and common types

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Kind of event reported by a counting device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Entry sensor saw people walking in
    Entry,
    /// Exit sensor saw people walking out
    Exit,
    /// Link to the device was lost
    Disconnection,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Entry => "ENTRY",
            EventType::Exit => "EXIT",
            EventType::Disconnection => "DISCONNECTION",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ENTRY" => Ok(EventType::Entry),
            "EXIT" => Ok(EventType::Exit),
            "DISCONNECTION" => Ok(EventType::Disconnection),
            other => Err(anyhow!("unknown event type: {}", other)),
        }
    }
}

impl ToSql for EventType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EventType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

/// A people-counting device (Arduino with two ultrasonic sensors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    /// Board model, e.g. "Arduino Nano" or "ESP32"
    pub device_type: String,
    pub mac_address: String,
    /// Maximum people allowed inside
    pub capacity: u32,
    pub location: String,
    /// Whether the simulation drives this device
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub device_type: String,
    pub location: String,
    pub capacity: u32,
}

impl Default for NewDevice {
    fn default() -> Self {
        Self {
            name: String::new(),
            device_type: "Arduino Nano".to_string(),
            location: String::new(),
            capacity: 100,
        }
    }
}

/// A single append-only sensor event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub id: i64,
    pub device_id: i64,
    pub event_type: EventType,
    pub people_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl SensorEvent {
    /// Build an event that has not been stored yet (id 0)
    pub fn new(device_id: i64, event_type: EventType, people_count: u32) -> Self {
        Self {
            id: 0,
            device_id,
            event_type,
            people_count,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Cumulative counter snapshot of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub device_id: i64,
    pub entered: u32,
    pub left: u32,
    /// Copied from the device so history survives capacity edits
    pub capacity: u32,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    pub fn occupancy(&self) -> u32 {
        self.entered.saturating_sub(self.left)
    }
}

/// Event produced by a source before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedEvent {
    pub event_type: EventType,
    pub people_count: u32,
}

/// Anything that can report events for a device
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Next event for `device` given its current occupancy, or `None` when
    /// nothing happened this cycle
    async fn poll(&mut self, device: &Device, occupancy: u32) -> Result<Option<ObservedEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trips_through_text() {
        for ty in [EventType::Entry, EventType::Exit, EventType::Disconnection] {
            assert_eq!(ty.as_str().parse::<EventType>().unwrap(), ty);
        }
        assert!("LEAVE".parse::<EventType>().is_err());
    }

    #[test]
    fn test_reading_occupancy_saturates() {
        let reading = SensorReading {
            id: 1,
            device_id: 1,
            entered: 3,
            left: 5,
            capacity: 10,
            timestamp: Utc::now(),
        };
        assert_eq!(reading.occupancy(), 0);
    }
}
