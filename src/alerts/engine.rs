// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Threshold checks with a per-device, per-kind cooldown

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

use super::{Alert, AlertKind, AlertSettings, AlertSnapshot};
use crate::sensors::Device;

/// Evaluates alert conditions and throttles repeats
pub struct AlertEngine {
    cooldown: Duration,
    last_fired: HashMap<(i64, AlertKind), DateTime<Utc>>,
}

impl AlertEngine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    pub fn from_secs(cooldown_secs: u64) -> Self {
        Self::new(Duration::seconds(cooldown_secs as i64))
    }

    /// Check every condition for one device and return the alerts that
    /// are both triggered and outside their cooldown
    pub fn evaluate(
        &mut self,
        device: &Device,
        snapshot: &AlertSnapshot,
        settings: &AlertSettings,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        triggered(snapshot, settings)
            .into_iter()
            .filter(|kind| self.try_fire(device.id, *kind, now))
            .map(|kind| build_alert(device, kind, snapshot, settings, now))
            .collect()
    }

    /// Drop cooldowns of devices that are gone or deactivated
    pub fn retain_devices(&mut self, device_ids: &[i64]) {
        self.last_fired.retain(|(id, _), _| device_ids.contains(id));
    }

    pub fn is_cooling_down(&self, device_id: i64) -> bool {
        self.last_fired.keys().any(|(id, _)| *id == device_id)
    }

    fn try_fire(&mut self, device_id: i64, kind: AlertKind, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_fired.get(&(device_id, kind)) {
            if now - *last < self.cooldown {
                debug!("Suppressed {} alert for device {} (cooldown)", kind, device_id);
                return false;
            }
        }
        self.last_fired.insert((device_id, kind), now);
        true
    }
}

/// Conditions that hold for this snapshot, in fixed order
pub fn triggered(snapshot: &AlertSnapshot, settings: &AlertSettings) -> Vec<AlertKind> {
    let mut kinds = Vec::new();
    let percent = snapshot.occupancy_percent();

    if settings.disconnection_enabled && snapshot.disconnected {
        kinds.push(AlertKind::Disconnection);
    }

    if settings.low_occupancy_enabled {
        if let Some(p) = percent {
            if p < settings.low_occupancy_threshold as f64 {
                kinds.push(AlertKind::LowOccupancy);
            }
        }
    }

    if settings.high_occupancy_enabled {
        if let Some(p) = percent {
            if p >= settings.high_occupancy_threshold as f64 {
                kinds.push(AlertKind::HighOccupancy);
            }
        }
    }

    if settings.traffic_peak_enabled && snapshot.recent_entries >= settings.traffic_peak_threshold {
        kinds.push(AlertKind::TrafficPeak);
    }

    kinds
}

fn build_alert(
    device: &Device,
    kind: AlertKind,
    snapshot: &AlertSnapshot,
    settings: &AlertSettings,
    now: DateTime<Utc>,
) -> Alert {
    let (title, message) = match kind {
        AlertKind::Disconnection => (
            "Device disconnected".to_string(),
            format!(
                "Device '{}' lost its connection. Check the sensor.",
                device.name
            ),
        ),
        AlertKind::LowOccupancy => (
            "Low occupancy".to_string(),
            format!(
                "Occupancy at '{}' is below the configured {}%: {} people",
                device.name, settings.low_occupancy_threshold, snapshot.occupancy
            ),
        ),
        AlertKind::HighOccupancy => (
            "High occupancy".to_string(),
            format!(
                "Occupancy at '{}' is at {}% of capacity: {} of {} people",
                device.name,
                snapshot.occupancy_percent().unwrap_or(0.0) as u32,
                snapshot.occupancy,
                snapshot.capacity
            ),
        ),
        AlertKind::TrafficPeak => (
            "Traffic peak".to_string(),
            format!(
                "Traffic peak at '{}': {} entries in the last few minutes",
                device.name, snapshot.recent_entries
            ),
        ),
    };

    Alert {
        id: uuid::Uuid::new_v4().to_string(),
        device_id: device.id,
        device_name: device.name.clone(),
        kind,
        severity: kind.severity(),
        title,
        message,
        timestamp: now,
    }
}
