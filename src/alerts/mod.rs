// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Alert module - threshold evaluation and throttling

mod engine;

pub use engine::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CounterError;

/// Global alert configuration, stored as a single row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSettings {
    pub disconnection_enabled: bool,

    pub low_occupancy_enabled: bool,
    /// Percentage of capacity
    pub low_occupancy_threshold: u32,

    pub high_occupancy_enabled: bool,
    /// Percentage of capacity
    pub high_occupancy_threshold: u32,

    pub traffic_peak_enabled: bool,
    /// Entries within the traffic window
    pub traffic_peak_threshold: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            disconnection_enabled: false,
            low_occupancy_enabled: false,
            low_occupancy_threshold: 5,
            high_occupancy_enabled: false,
            high_occupancy_threshold: 90,
            traffic_peak_enabled: false,
            traffic_peak_threshold: 10,
        }
    }
}

impl AlertSettings {
    pub fn validate(&self) -> Result<(), CounterError> {
        if self.low_occupancy_threshold > 100 {
            return Err(CounterError::InvalidAlertSettings(format!(
                "low occupancy threshold {}% is above 100%",
                self.low_occupancy_threshold
            )));
        }
        if self.high_occupancy_threshold > 100 {
            return Err(CounterError::InvalidAlertSettings(format!(
                "high occupancy threshold {}% is above 100%",
                self.high_occupancy_threshold
            )));
        }
        if self.traffic_peak_threshold == 0 {
            return Err(CounterError::InvalidAlertSettings(
                "traffic peak threshold must be at least 1 entry".to_string(),
            ));
        }
        Ok(())
    }

    pub fn any_enabled(&self) -> bool {
        self.disconnection_enabled
            || self.low_occupancy_enabled
            || self.high_occupancy_enabled
            || self.traffic_peak_enabled
    }
}

/// Alert kinds, each throttled independently per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Disconnection,
    LowOccupancy,
    HighOccupancy,
    TrafficPeak,
}

impl AlertKind {
    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::Disconnection => Severity::High,
            AlertKind::LowOccupancy | AlertKind::HighOccupancy | AlertKind::TrafficPeak => {
                Severity::Medium
            }
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertKind::Disconnection => "disconnection",
            AlertKind::LowOccupancy => "low-occupancy",
            AlertKind::HighOccupancy => "high-occupancy",
            AlertKind::TrafficPeak => "traffic-peak",
        };
        f.write_str(name)
    }
}

/// Severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

/// A fired alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub device_id: i64,
    pub device_name: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// What the evaluator knows about a device at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSnapshot {
    pub occupancy: u32,
    pub capacity: u32,
    /// People who entered within the traffic window
    pub recent_entries: u32,
    /// The device reported a disconnection this cycle
    pub disconnected: bool,
}

impl AlertSnapshot {
    /// Occupancy as a percentage of capacity, `None` without a capacity
    pub fn occupancy_percent(&self) -> Option<f64> {
        if self.capacity == 0 {
            None
        } else {
            Some(self.occupancy as f64 * 100.0 / self.capacity as f64)
        }
    }
}
