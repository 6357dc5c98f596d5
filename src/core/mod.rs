// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Core engine module - orchestrates simulation, alerts and cleanup

mod engine;
mod event_bus;

pub use engine::Engine;
pub use event_bus::{BusEventType, Event, EventBus, EventPayload};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System-wide state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemState {
    pub running: bool,
    pub active_devices: usize,
    pub total_events: u64,
    pub total_alerts: u64,
    pub last_alert: Option<DateTime<Utc>>,
    pub uptime_seconds: u64,
}
