// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Event bus for inter-component communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::alerts::Alert;
use crate::sensors::SensorEvent;

/// Kinds of message on the generic stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusEventType {
    SensorEvent,
    Alert,
    SystemStatus,
    Error,
}

/// Generic event wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub event_type: BusEventType,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Sensor(SensorEvent),
    Alert(Alert),
    Status { key: String, value: String },
    Error { device_id: Option<i64>, message: String },
}

/// Central event bus for pub/sub communication
pub struct EventBus {
    sensor_tx: broadcast::Sender<SensorEvent>,
    alert_tx: broadcast::Sender<Alert>,
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sensor_tx, _) = broadcast::channel(capacity);
        let (alert_tx, _) = broadcast::channel(capacity);
        let (event_tx, _) = broadcast::channel(capacity);

        Self {
            sensor_tx,
            alert_tx,
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    pub fn publish_sensor_event(&self, event: SensorEvent) {
        let _ = self.sensor_tx.send(event.clone());
        self.publish_event(BusEventType::SensorEvent, EventPayload::Sensor(event));
    }

    pub fn publish_alert(&self, alert: Alert) {
        let _ = self.alert_tx.send(alert.clone());
        self.publish_event(BusEventType::Alert, EventPayload::Alert(alert));
    }

    pub fn publish_status(&self, key: &str, value: &str) {
        self.publish_event(
            BusEventType::SystemStatus,
            EventPayload::Status {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn publish_error(&self, device_id: Option<i64>, message: &str) {
        self.publish_event(
            BusEventType::Error,
            EventPayload::Error {
                device_id,
                message: message.to_string(),
            },
        );
    }

    fn publish_event(&self, event_type: BusEventType, payload: EventPayload) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            event_type,
            timestamp: Utc::now(),
            payload,
        };
        let _ = self.event_tx.send(event);
    }

    /// Number of generic events published so far
    pub fn published(&self) -> u64 {
        self.event_counter.load(Ordering::Relaxed)
    }

    pub fn subscribe_sensor_events(&self) -> broadcast::Receiver<SensorEvent> {
        self.sensor_tx.subscribe()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}
