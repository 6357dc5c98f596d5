// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Main engine - owns the background tasks of a running counter

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use super::{EventBus, SystemState};
use crate::alerts::Alert;
use crate::config::Config;
use crate::db::Database;
use crate::sensors::SimulationService;

/// Main footfall engine
pub struct Engine {
    pub config: Arc<Config>,
    db: Database,
    event_bus: Arc<EventBus>,
    state: Arc<RwLock<SystemState>>,
    recent_alerts: Arc<RwLock<VecDeque<Alert>>>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    start_time: Option<Instant>,
}

impl Engine {
    pub fn new(config: Config, db: Database) -> Self {
        let (shutdown_tx, _) = broadcast::channel(4);

        Self {
            config: Arc::new(config),
            db,
            event_bus: Arc::new(EventBus::default()),
            state: Arc::new(RwLock::new(SystemState::default())),
            recent_alerts: Arc::new(RwLock::new(VecDeque::new())),
            shutdown_tx,
            tasks: Vec::new(),
            start_time: None,
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Spawn the simulation, the alert listener and the retention cleanup
    pub async fn start(&mut self) -> Result<()> {
        if !self.tasks.is_empty() {
            warn!("Engine already running");
            return Ok(());
        }

        info!("Starting footfall engine...");
        self.start_time = Some(Instant::now());

        // Subscribe before the simulation can publish anything
        let listener = self.spawn_listener();
        self.tasks.push(listener);

        let mut simulation =
            SimulationService::new(self.db.clone(), &self.config, self.event_bus.clone());
        let shutdown = self.shutdown_tx.subscribe();
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = simulation.run(shutdown).await {
                error!("Simulation stopped with error: {:#}", e);
            }
        }));

        let cleanup = self.spawn_cleanup();
        self.tasks.push(cleanup);

        let active = self.db.list_active_devices()?.len();
        {
            let mut state = self.state.write().await;
            state.running = true;
            state.active_devices = active;
        }

        self.event_bus.publish_status("engine", "running");
        info!("Footfall engine started with {} active devices", active);
        Ok(())
    }

    /// Signal shutdown and wait for every task to finish
    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping footfall engine...");
        let _ = self.shutdown_tx.send(());

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Engine task panicked: {}", e);
            }
        }

        {
            let mut state = self.state.write().await;
            state.running = false;
        }

        self.event_bus.publish_status("engine", "stopped");
        info!("Footfall engine stopped");
        Ok(())
    }

    pub async fn state(&self) -> SystemState {
        let mut state = self.state.read().await.clone();
        state.uptime_seconds = self.uptime();
        if let Ok(devices) = self.db.list_active_devices() {
            state.active_devices = devices.len();
        }
        state
    }

    /// Most recent alerts, newest first
    pub async fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        self.recent_alerts
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    fn spawn_listener(&self) -> JoinHandle<()> {
        let mut events = self.event_bus.subscribe_sensor_events();
        let mut alerts = self.event_bus.subscribe_alerts();
        let mut shutdown = self.shutdown_tx.subscribe();
        let state = self.state.clone();
        let recent = self.recent_alerts.clone();
        let history_size = self.config.alerts.history_size.max(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(_) => state.write().await.total_events += 1,
                        Err(RecvError::Lagged(n)) => {
                            warn!("Listener lagged, {} sensor events not counted", n);
                            state.write().await.total_events += n;
                        }
                        Err(RecvError::Closed) => break,
                    },
                    alert = alerts.recv() => match alert {
                        Ok(alert) => {
                            warn!("[{:?}] {}: {}", alert.severity, alert.title, alert.message);
                            {
                                let mut state = state.write().await;
                                state.total_alerts += 1;
                                state.last_alert = Some(alert.timestamp);
                            }
                            let mut history = recent.write().await;
                            history.push_back(alert);
                            while history.len() > history_size {
                                history.pop_front();
                            }
                        }
                        Err(RecvError::Lagged(n)) => warn!("Listener lagged, {} alerts dropped", n),
                        Err(RecvError::Closed) => break,
                    },
                    _ = shutdown.recv() => {
                        debug!("Alert listener shutting down...");
                        break;
                    }
                }
            }
        })
    }

    fn spawn_cleanup(&self) -> JoinHandle<()> {
        let db = self.db.clone();
        let retention_days = self.config.database.retention_days;
        let period = Duration::from_secs(self.config.database.cleanup_interval_secs.max(1));
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => match db.cleanup(retention_days) {
                        Ok(0) => {}
                        Ok(n) => info!("Retention cleanup removed {} rows", n),
                        Err(e) => error!("Retention cleanup failed: {:#}", e),
                    },
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertSettings;
    use crate::sensors::NewDevice;

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.simulation.seed = Some(3);
        config.simulation.min_interval_ms = 5;
        config.simulation.max_interval_ms = 10;
        config.simulation.event_probability = 1.0;
        config.simulation.disconnection_probability = 0.0;
        config
    }

    #[tokio::test]
    async fn test_engine_start_stop() {
        let db = Database::open_in_memory().unwrap();
        let device = db
            .insert_device(&NewDevice {
                name: "Front door".into(),
                capacity: 2,
                ..NewDevice::default()
            })
            .unwrap();
        db.save_alert_settings(&AlertSettings {
            high_occupancy_enabled: true,
            high_occupancy_threshold: 50,
            ..AlertSettings::default()
        })
        .unwrap();

        let mut engine = Engine::new(fast_config(), db.clone());
        engine.start().await.unwrap();
        assert!(engine.state().await.running);

        tokio::time::sleep(Duration::from_millis(200)).await;
        engine.stop().await.unwrap();

        let state = engine.state().await;
        assert!(!state.running);
        assert_eq!(state.active_devices, 1);
        assert!(state.total_events > 0);
        assert!(state.total_events as usize <= db.event_count(device.id).unwrap());

        // the first entry puts a 2-person store at 50%
        assert!(state.total_alerts >= 1);
        assert!(state.last_alert.is_some());
        assert!(!engine.recent_alerts(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let db = Database::open_in_memory().unwrap();
        let mut engine = Engine::new(Config::default(), db);
        engine.stop().await.unwrap();
        assert!(!engine.state().await.running);
        assert_eq!(engine.uptime(), 0);
    }
}
