// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{from_millis, to_millis, Database};
use crate::error::CounterError;
use crate::sensors::{generate_mac_address, Device, NewDevice};

const DEVICE_COLUMNS: &str =
    "id, name, device_type, mac_address, capacity, location, is_active, created_at";

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        name: row.get(1)?,
        device_type: row.get(2)?,
        mac_address: row.get(3)?,
        capacity: row.get(4)?,
        location: row.get(5)?,
        is_active: row.get(6)?,
        created_at: from_millis(row.get(7)?),
    })
}

impl Database {
    /// Register a device with a freshly generated MAC address
    pub fn insert_device(&self, new: &NewDevice) -> Result<Device> {
        if new.name.trim().is_empty() {
            return Err(CounterError::EmptyDeviceName.into());
        }
        if new.capacity == 0 {
            return Err(CounterError::InvalidCapacity.into());
        }

        let device = Device {
            id: 0,
            name: new.name.trim().to_string(),
            device_type: new.device_type.clone(),
            mac_address: generate_mac_address(),
            capacity: new.capacity,
            location: new.location.clone(),
            is_active: true,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO devices (name, device_type, mac_address, capacity, location, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                device.name,
                device.device_type,
                device.mac_address,
                device.capacity,
                device.location,
                device.is_active,
                to_millis(device.created_at),
            ],
        )?;
        let id = conn.last_insert_rowid();

        info!("Registered device {} ({}) at {:?}", id, device.name, device.location);
        Ok(Device { id, ..device })
    }

    pub fn get_device(&self, id: i64) -> Result<Option<Device>> {
        let conn = self.conn.lock();
        let device = conn
            .query_row(
                &format!("SELECT {} FROM devices WHERE id = ?1", DEVICE_COLUMNS),
                params![id],
                device_from_row,
            )
            .optional()?;
        Ok(device)
    }

    /// Like [`Database::get_device`] but a missing device is an error
    pub fn require_device(&self, id: i64) -> Result<Device> {
        self.get_device(id)?
            .ok_or_else(|| CounterError::DeviceNotFound(id).into())
    }

    /// All devices, newest first
    pub fn list_devices(&self) -> Result<Vec<Device>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM devices ORDER BY created_at DESC, id DESC",
            DEVICE_COLUMNS
        ))?;
        let devices = stmt
            .query_map([], device_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(devices)
    }

    pub fn list_active_devices(&self) -> Result<Vec<Device>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM devices WHERE is_active = 1 ORDER BY id ASC",
            DEVICE_COLUMNS
        ))?;
        let devices = stmt
            .query_map([], device_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(devices)
    }

    /// Overwrite the editable fields of a device
    pub fn update_device(&self, device: &Device) -> Result<()> {
        if device.name.trim().is_empty() {
            return Err(CounterError::EmptyDeviceName.into());
        }
        if device.capacity == 0 {
            return Err(CounterError::InvalidCapacity.into());
        }

        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE devices SET name = ?1, device_type = ?2, capacity = ?3, location = ?4, is_active = ?5
             WHERE id = ?6",
            params![
                device.name,
                device.device_type,
                device.capacity,
                device.location,
                device.is_active,
                device.id,
            ],
        )?;

        if changed == 0 {
            return Err(CounterError::DeviceNotFound(device.id).into());
        }
        Ok(())
    }

    pub fn set_device_active(&self, id: i64, is_active: bool) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE devices SET is_active = ?1 WHERE id = ?2",
            params![is_active, id],
        )?;

        if changed == 0 {
            return Err(CounterError::DeviceNotFound(id).into());
        }
        let state = if is_active { "activated" } else { "deactivated" };
        info!("Device {} {}", id, state);
        Ok(())
    }

    /// Delete a device together with its events and readings
    pub fn delete_device(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM devices WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(CounterError::DeviceNotFound(id).into());
        }
        info!("Deleted device {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{EventType, SensorEvent, SensorReading};

    fn new_device(name: &str, capacity: u32) -> NewDevice {
        NewDevice {
            name: name.to_string(),
            device_type: "ESP32".to_string(),
            location: "Entrada Principal".to_string(),
            capacity,
        }
    }

    #[test]
    fn test_insert_and_get_device() {
        let db = Database::open_in_memory().unwrap();
        let device = db.insert_device(&new_device("Main door", 50)).unwrap();

        let stored = db.get_device(device.id).unwrap().unwrap();
        assert_eq!(stored.name, "Main door");
        assert_eq!(stored.capacity, 50);
        assert!(stored.is_active);
        assert_eq!(stored.mac_address.len(), 17);
    }

    #[test]
    fn test_rejects_blank_name_and_zero_capacity() {
        let db = Database::open_in_memory().unwrap();

        let err = db.insert_device(&new_device("   ", 50)).unwrap_err();
        assert_eq!(err.downcast_ref::<CounterError>(), Some(&CounterError::EmptyDeviceName));

        let err = db.insert_device(&new_device("Door", 0)).unwrap_err();
        assert_eq!(err.downcast_ref::<CounterError>(), Some(&CounterError::InvalidCapacity));
    }

    #[test]
    fn test_list_filters_active() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_device(&new_device("A", 10)).unwrap();
        let b = db.insert_device(&new_device("B", 10)).unwrap();

        db.set_device_active(a.id, false).unwrap();

        assert_eq!(db.list_devices().unwrap().len(), 2);
        let active = db.list_active_devices().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);
    }

    #[test]
    fn test_update_device() {
        let db = Database::open_in_memory().unwrap();
        let mut device = db.insert_device(&new_device("A", 10)).unwrap();

        device.capacity = 25;
        device.location = "Probadores".to_string();
        db.update_device(&device).unwrap();

        let stored = db.require_device(device.id).unwrap();
        assert_eq!(stored.capacity, 25);
        assert_eq!(stored.location, "Probadores");
    }

    #[test]
    fn test_missing_device_errors() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_device(99).unwrap().is_none());

        let err = db.set_device_active(99, true).unwrap_err();
        assert_eq!(err.downcast_ref::<CounterError>(), Some(&CounterError::DeviceNotFound(99)));
        assert!(db.delete_device(99).is_err());
    }

    #[test]
    fn test_delete_cascades_to_events_and_readings() {
        let db = Database::open_in_memory().unwrap();
        let device = db.insert_device(&new_device("A", 10)).unwrap();
        db.insert_event(&SensorEvent::new(device.id, EventType::Entry, 2)).unwrap();
        db.insert_reading(&SensorReading {
            id: 0,
            device_id: device.id,
            entered: 2,
            left: 0,
            capacity: 10,
            timestamp: Utc::now(),
        })
        .unwrap();

        let before = db.get_stats().unwrap();
        assert_eq!((before.event_count, before.reading_count), (1, 1));

        db.delete_device(device.id).unwrap();

        let after = db.get_stats().unwrap();
        assert!(db.get_device(device.id).unwrap().is_none());
        assert_eq!(after.event_count, 0);
        assert_eq!(after.reading_count, 0);
    }
}
