// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Running occupancy curve derived from the event log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensors::{EventType, SensorEvent};

/// Headroom added above the peak for chart scaling
const CHART_PADDING: f32 = 1.2;

/// Occupancy at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f32,
}

/// Occupancy over time plus the scale needed to draw it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyChartData {
    pub points: Vec<ChartPoint>,
    pub max_value: f32,
    pub min_value: f32,
}

impl OccupancyChartData {
    pub fn has_data(&self) -> bool {
        !self.points.is_empty()
    }

    /// Occupancy after the last event
    pub fn current(&self) -> u32 {
        self.points.last().map(|p| p.value as u32).unwrap_or(0)
    }

    pub fn peak(&self) -> u32 {
        self.points
            .iter()
            .map(|p| p.value as u32)
            .max()
            .unwrap_or(0)
    }
}

/// Replay entries and exits in time order, flooring at zero after every
/// step. Disconnections do not move occupancy and produce no point.
pub fn occupancy_curve(events: &[SensorEvent]) -> OccupancyChartData {
    let mut sorted: Vec<&SensorEvent> = events
        .iter()
        .filter(|e| e.event_type != EventType::Disconnection)
        .collect();

    if sorted.is_empty() {
        return OccupancyChartData::default();
    }

    sorted.sort_by_key(|e| (e.timestamp, e.id));

    let mut occupancy: i64 = 0;
    let mut points = Vec::with_capacity(sorted.len());

    for event in sorted {
        match event.event_type {
            EventType::Entry => occupancy += event.people_count as i64,
            EventType::Exit => occupancy -= event.people_count as i64,
            EventType::Disconnection => {}
        }
        occupancy = occupancy.max(0);

        points.push(ChartPoint {
            timestamp: event.timestamp,
            value: occupancy as f32,
        });
    }

    let peak = points.iter().map(|p| p.value).fold(0.0_f32, f32::max);

    OccupancyChartData {
        points,
        max_value: peak * CHART_PADDING,
        min_value: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(kind: EventType, count: u32, minute: i64, base: DateTime<Utc>) -> SensorEvent {
        SensorEvent::new(1, kind, count).at(base + Duration::minutes(minute))
    }

    #[test]
    fn test_empty_events_give_empty_curve() {
        let curve = occupancy_curve(&[]);
        assert!(!curve.has_data());
        assert_eq!(curve.max_value, 0.0);
        assert_eq!(curve.current(), 0);
    }

    #[test]
    fn test_curve_is_sorted_and_floored() {
        let base = Utc::now();
        let events = vec![
            event(EventType::Exit, 5, 20, base),
            event(EventType::Entry, 2, 0, base),
            event(EventType::Entry, 1, 10, base),
            event(EventType::Entry, 4, 30, base),
        ];

        let curve = occupancy_curve(&events);
        let values: Vec<f32> = curve.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 0.0, 4.0]);
        assert_eq!(curve.peak(), 4);
        assert_eq!(curve.current(), 4);
        assert!((curve.max_value - 4.8).abs() < 1e-5);
    }

    #[test]
    fn test_disconnections_are_skipped() {
        let base = Utc::now();
        let events = vec![
            event(EventType::Entry, 1, 0, base),
            event(EventType::Disconnection, 0, 1, base),
            event(EventType::Exit, 1, 2, base),
        ];

        let curve = occupancy_curve(&events);
        assert_eq!(curve.points.len(), 2);
    }
}
