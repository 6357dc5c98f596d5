// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Analysis module - occupancy curves, report statistics, date ranges

mod occupancy;
mod range;
mod statistics;

pub use occupancy::*;
pub use range::*;
pub use statistics::*;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::sensors::{Device, SensorEvent};

/// Everything a report view needs for one device and range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    pub device: Device,
    pub range: DateRange,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub events: Vec<SensorEvent>,
    pub curve: OccupancyChartData,
    pub stats: ReportStats,
}

/// Builds reports and summaries from the event log
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Report for a range ending now, midnight taken in local time
    pub fn device_report(&self, device_id: i64, range: DateRange) -> Result<DeviceReport> {
        let (start, end) = range.time_range(Local::now());
        self.device_report_between(device_id, range, start, end)
    }

    pub fn device_report_between(
        &self,
        device_id: i64,
        range: DateRange,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DeviceReport> {
        let device = self.db.require_device(device_id)?;
        let events = self.db.events_in_range(device_id, start, end)?;
        let curve = occupancy_curve(&events);
        let stats = ReportStats::from_events(&events, &curve);

        debug!(
            "Report for device {} ({}): {} events, peak {}",
            device_id,
            range,
            events.len(),
            stats.peak_occupancy
        );

        Ok(DeviceReport {
            device,
            range,
            start,
            end,
            events,
            curve,
            stats,
        })
    }

    /// All-time totals per device, newest device first
    pub fn device_summaries(&self) -> Result<Vec<DeviceSummary>> {
        self.db
            .list_devices()?
            .iter()
            .map(|device| {
                let entered = self.db.total_entered(device.id)?;
                let left = self.db.total_left(device.id)?;
                Ok(DeviceSummary::new(device, entered, left))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{EventType, NewDevice};
    use chrono::Duration;

    fn setup() -> (Database, Device) {
        let db = Database::open_in_memory().unwrap();
        let device = db
            .insert_device(&NewDevice {
                name: "Front door".into(),
                capacity: 10,
                ..NewDevice::default()
            })
            .unwrap();
        (db, device)
    }

    #[test]
    fn test_report_between_bounds() {
        let (db, device) = setup();
        let base = Utc::now() - Duration::hours(2);

        db.insert_events(&[
            SensorEvent::new(device.id, EventType::Entry, 2).at(base),
            SensorEvent::new(device.id, EventType::Exit, 1).at(base + Duration::minutes(30)),
            SensorEvent::new(device.id, EventType::Exit, 1).at(base + Duration::minutes(60)),
            // outside the requested window
            SensorEvent::new(device.id, EventType::Entry, 5).at(base + Duration::minutes(200)),
        ])
        .unwrap();

        let service = ReportService::new(db);
        let report = service
            .device_report_between(
                device.id,
                DateRange::Today,
                base,
                base + Duration::minutes(90),
            )
            .unwrap();

        assert_eq!(report.events.len(), 3);
        assert_eq!(report.stats.total_entries, 2);
        assert_eq!(report.stats.total_exits, 2);
        assert_eq!(report.stats.peak_occupancy, 2);
        assert_eq!(report.stats.current_occupancy, 0);
        // 2x30 + 1x30 = 90 person-minutes over 2 exits
        assert_eq!(report.stats.avg_dwell_minutes, 45);
    }

    #[test]
    fn test_report_for_unknown_device_fails() {
        let (db, _) = setup();
        let service = ReportService::new(db);
        assert!(service.device_report(999, DateRange::Today).is_err());
    }

    #[test]
    fn test_device_summaries() {
        let (db, device) = setup();
        db.insert_events(&[
            SensorEvent::new(device.id, EventType::Entry, 3),
            SensorEvent::new(device.id, EventType::Exit, 1),
        ])
        .unwrap();

        let summaries = ReportService::new(db).device_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].entered, 3);
        assert_eq!(summaries[0].left, 1);
        assert_eq!(summaries[0].occupancy, 2);
        assert!((summaries[0].occupancy_percent() - 20.0).abs() < 1e-9);
    }
}
