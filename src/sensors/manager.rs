// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulation service - drives every active device through its event source

use anyhow::Result;
use chrono::Utc;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use super::simulator::OccupancySimulator;
use super::{Device, EventSource, EventType, SensorEvent, SensorReading};
use crate::alerts::{Alert, AlertEngine, AlertSettings, AlertSnapshot};
use crate::config::{AlertConfig, Config, SimulationConfig};
use crate::core::EventBus;
use crate::db::Database;

/// What one simulation cycle did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub devices: usize,
    pub events: Vec<SensorEvent>,
    pub alerts: Vec<Alert>,
    pub errors: usize,
}

/// Polls the event source for each active device and persists the result
pub struct SimulationService {
    db: Database,
    source: Box<dyn EventSource>,
    alerts: AlertEngine,
    config: SimulationConfig,
    alert_config: AlertConfig,
    event_bus: Arc<EventBus>,
    delay_rng: ChaCha8Rng,
}

impl SimulationService {
    /// Service backed by the occupancy simulator
    pub fn new(db: Database, config: &Config, event_bus: Arc<EventBus>) -> Self {
        let source = Box::new(OccupancySimulator::new(&config.simulation));
        Self::with_source(db, source, config, event_bus)
    }

    pub fn with_source(
        db: Database,
        source: Box<dyn EventSource>,
        config: &Config,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let delay_rng = match config.simulation.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            db,
            source,
            alerts: AlertEngine::from_secs(config.alerts.cooldown_secs),
            config: config.simulation.clone(),
            alert_config: config.alerts.clone(),
            event_bus,
            delay_rng,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn alert_engine(&self) -> &AlertEngine {
        &self.alerts
    }

    /// Run cycles until shutdown, sleeping a random delay after each one
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!("Starting simulation with source '{}'...", self.source.name());

        loop {
            match self.tick().await {
                Ok(report) => debug!(
                    "Cycle done: {} devices, {} events, {} alerts, {} errors",
                    report.devices,
                    report.events.len(),
                    report.alerts.len(),
                    report.errors
                ),
                Err(e) => error!("Simulation cycle failed: {:#}", e),
            }

            let delay = self.next_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    info!("Simulation shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }

    /// One cycle over all active devices. Failures of a single device are
    /// logged and counted, the remaining devices still run.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let devices = self.db.list_active_devices()?;
        let settings = self.db.alert_settings()?;

        let active: Vec<i64> = devices.iter().map(|d| d.id).collect();
        self.alerts.retain_devices(&active);

        let mut report = TickReport {
            devices: devices.len(),
            ..TickReport::default()
        };

        for device in &devices {
            match self.process_device(device, &settings).await {
                Ok((event, alerts)) => {
                    report.events.extend(event);
                    report.alerts.extend(alerts);
                }
                Err(e) => {
                    warn!("Device {} ({}) failed: {:#}", device.id, device.name, e);
                    self.event_bus.publish_error(Some(device.id), &e.to_string());
                    report.errors += 1;
                }
            }
        }

        Ok(report)
    }

    async fn process_device(
        &mut self,
        device: &Device,
        settings: &AlertSettings,
    ) -> Result<(Option<SensorEvent>, Vec<Alert>)> {
        let occupancy = self.db.current_occupancy(device.id)?;
        let observed = self.source.poll(device, occupancy).await?;

        let event = match observed {
            Some(observed) => {
                let mut event =
                    SensorEvent::new(device.id, observed.event_type, observed.people_count);
                event.id = self.db.insert_event(&event)?;
                debug!(
                    "{}: {} x{}",
                    device.name, event.event_type, event.people_count
                );
                self.event_bus.publish_sensor_event(event.clone());
                Some(event)
            }
            None => None,
        };

        let entered = self.db.total_entered(device.id)?;
        let left = self.db.total_left(device.id)?;

        if self.config.record_readings {
            self.db.insert_reading(&SensorReading {
                id: 0,
                device_id: device.id,
                entered,
                left,
                capacity: device.capacity,
                timestamp: Utc::now(),
            })?;
        }

        if !settings.any_enabled() {
            return Ok((event, Vec::new()));
        }

        let now = Utc::now();
        let window = chrono::Duration::seconds(self.alert_config.traffic_window_secs as i64);
        let snapshot = AlertSnapshot {
            occupancy: entered.saturating_sub(left),
            capacity: device.capacity,
            recent_entries: self.db.entries_since(device.id, now - window)?,
            disconnected: event
                .as_ref()
                .map(|e| e.event_type == EventType::Disconnection)
                .unwrap_or(false),
        };

        let fired = self.alerts.evaluate(device, &snapshot, settings, now);
        for alert in &fired {
            self.event_bus.publish_alert(alert.clone());
        }

        Ok((event, fired))
    }

    fn next_delay(&mut self) -> Duration {
        let low = self.config.min_interval_ms.min(self.config.max_interval_ms);
        let high = self.config.min_interval_ms.max(self.config.max_interval_ms);
        Duration::from_millis(self.delay_rng.gen_range(low..=high))
    }
}
