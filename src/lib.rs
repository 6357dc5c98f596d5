// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Footfall - people counting for retail entrances
//!
//! A headless counting engine with:
//! - Simulated entry/exit sensors driven by how full the store is
//! - An append-only SQLite event log with retention cleanup
//! - Occupancy curves, dwell time and date-range reports
//! - Threshold alerts with per-device cooldowns
//! - CSV and JSON-lines export
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Footfall Engine                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────┐   ┌───────────────────┐   │
//! │  │ Simulation │ → │  Alert   │ → │  Alert listener   │   │
//! │  │  Service   │   │  Engine  │   │  (recent alerts)  │   │
//! │  └────────────┘   └──────────┘   └───────────────────┘   │
//! │        ↓               ↓                   ↑             │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │                    Event Bus                       │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │        ↓                                                 │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐  ┌────────┐  │
//! │  │ Database │ → │ Reports  │ → │  Export  │  │  Auth  │  │
//! │  └──────────┘   └──────────┘   └──────────┘  └────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod alerts;
pub mod analysis;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod export;
pub mod security;
pub mod sensors;

// Re-exports for convenience
pub use alerts::{Alert, AlertEngine, AlertKind, AlertSettings};
pub use analysis::{DateRange, ReportService, ReportStats};
pub use config::Config;
pub use self::core::{Engine, EventBus, SystemState};
pub use db::Database;
pub use error::CounterError;
pub use export::{EventExporter, ExportFormat};
pub use security::{AuditLog, AuthManager};
pub use sensors::{Device, EventType, SensorEvent, SimulationService};

/// Footfall version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Footfall name
pub const NAME: &str = "Footfall";
