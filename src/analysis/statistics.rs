// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Report statistics and dwell time

use serde::{Deserialize, Serialize};

use super::{ChartPoint, OccupancyChartData};
use crate::sensors::{Device, EventType, SensorEvent};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Summary numbers for a device over a time range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub total_entries: u32,
    pub total_exits: u32,
    pub current_occupancy: u32,
    pub peak_occupancy: u32,
    /// Average visit length in whole minutes
    pub avg_dwell_minutes: u32,
    pub disconnections: u32,
}

impl ReportStats {
    pub fn from_events(events: &[SensorEvent], curve: &OccupancyChartData) -> Self {
        if events.is_empty() {
            return Self::default();
        }

        let sum = |kind: EventType| -> u32 {
            events
                .iter()
                .filter(|e| e.event_type == kind)
                .map(|e| e.people_count)
                .sum()
        };

        let total_entries = sum(EventType::Entry);
        let total_exits = sum(EventType::Exit);
        let disconnections = events
            .iter()
            .filter(|e| e.event_type == EventType::Disconnection)
            .count() as u32;

        Self {
            total_entries,
            total_exits,
            current_occupancy: curve.current(),
            peak_occupancy: curve.peak(),
            avg_dwell_minutes: average_dwell_minutes(&curve.points, total_exits),
            disconnections,
        }
    }
}

/// Person-minutes under the occupancy step curve divided by the number of
/// people who left, truncated to whole minutes.
///
/// Each point's occupancy holds until the next point, so the area is
/// `sum(occupancy[i] * (t[i+1] - t[i]))`. Returns 0 with fewer than two
/// points or no exits.
pub fn average_dwell_minutes(points: &[ChartPoint], total_exits: u32) -> u32 {
    if points.len() < 2 || total_exits == 0 {
        return 0;
    }

    let person_minutes: f64 = points
        .windows(2)
        .map(|pair| {
            let elapsed = pair[1].timestamp - pair[0].timestamp;
            let minutes = elapsed.num_milliseconds() as f64 / MILLIS_PER_MINUTE;
            pair[0].value as f64 * minutes
        })
        .sum();

    (person_minutes / total_exits as f64).max(0.0) as u32
}

/// Dashboard line for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub device_id: i64,
    pub name: String,
    pub is_active: bool,
    pub entered: u32,
    pub left: u32,
    pub occupancy: u32,
    pub capacity: u32,
}

impl DeviceSummary {
    pub fn new(device: &Device, entered: u32, left: u32) -> Self {
        Self {
            device_id: device.id,
            name: device.name.clone(),
            is_active: device.is_active,
            entered,
            left,
            occupancy: entered.saturating_sub(left),
            capacity: device.capacity,
        }
    }

    pub fn occupancy_percent(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.occupancy as f64 * 100.0 / self.capacity as f64
        }
    }
}
