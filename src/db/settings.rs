// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::Database;
use crate::alerts::AlertSettings;

impl Database {
    /// The global alert settings, or the defaults if never saved
    pub fn alert_settings(&self) -> Result<AlertSettings> {
        let conn = self.conn.lock();
        let settings = conn
            .query_row(
                "SELECT disconnection_enabled, low_occupancy_enabled, low_occupancy_threshold,
                        high_occupancy_enabled, high_occupancy_threshold,
                        traffic_peak_enabled, traffic_peak_threshold
                 FROM alert_settings WHERE id = 1",
                [],
                |row| {
                    Ok(AlertSettings {
                        disconnection_enabled: row.get(0)?,
                        low_occupancy_enabled: row.get(1)?,
                        low_occupancy_threshold: row.get(2)?,
                        high_occupancy_enabled: row.get(3)?,
                        high_occupancy_threshold: row.get(4)?,
                        traffic_peak_enabled: row.get(5)?,
                        traffic_peak_threshold: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and store the singleton settings row
    pub fn save_alert_settings(&self, settings: &AlertSettings) -> Result<()> {
        settings.validate()?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO alert_settings
                (id, disconnection_enabled, low_occupancy_enabled, low_occupancy_threshold,
                 high_occupancy_enabled, high_occupancy_threshold,
                 traffic_peak_enabled, traffic_peak_threshold)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                settings.disconnection_enabled,
                settings.low_occupancy_enabled,
                settings.low_occupancy_threshold,
                settings.high_occupancy_enabled,
                settings.high_occupancy_threshold,
                settings.traffic_peak_enabled,
                settings.traffic_peak_threshold,
            ],
        )?;

        info!("Alert settings saved: {:?}", settings);
        Ok(())
    }
}
