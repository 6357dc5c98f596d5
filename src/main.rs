// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Footfall - people counting for retail entrances
//!
//! Command-line front end: runs the simulation engine and manages devices,
//! reports, exports, alert settings and users in the local database.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use footfall::analysis::{DateRange, ReportService};
use footfall::db::{Database, DEFAULT_EVENT_LIMIT};
use footfall::export::{EventExporter, ExportFormat};
use footfall::security::{AuditLog, AuthManager};
use footfall::sensors::NewDevice;
use footfall::{AlertSettings, Config, Engine, EventBus, SimulationService, VERSION};

/// Footfall - people counting for retail entrances
#[derive(Parser, Debug)]
#[command(name = "footfall")]
#[command(author = "footfall contributors")]
#[command(version = VERSION)]
#[command(about = "Simulated people counting, occupancy reports and alerts")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overrides the configured path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Fixed RNG seed for the simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulation engine until Ctrl+C
    Run {
        /// Run this many cycles back to back and exit
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Manage counting devices
    #[command(subcommand)]
    Device(DeviceCommand),

    /// List the most recent events of a device
    Events {
        device_id: i64,

        #[arg(short, long, default_value_t = DEFAULT_EVENT_LIMIT)]
        limit: usize,
    },

    /// Occupancy report for a device
    Report {
        device_id: i64,

        /// today, 7d or 30d
        #[arg(short, long, default_value = "today")]
        range: DateRange,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a device's events to a file
    Export {
        device_id: i64,

        /// today, 7d or 30d
        #[arg(short, long, default_value = "today")]
        range: DateRange,

        /// csv or json, defaults to the configured format
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Also write a plain-text summary
        #[arg(long)]
        summary: bool,

        /// Output directory, defaults to the configured export path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or change alert settings
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Register users and check credentials
    #[command(subcommand)]
    User(UserCommand),

    /// Delete events and readings older than the retention window
    Cleanup {
        /// Retention in days, defaults to the configured value
        #[arg(long)]
        days: Option<u32>,
    },

    /// Database statistics and per-device totals
    Stats,
}

#[derive(Subcommand, Debug)]
enum DeviceCommand {
    /// Register a new device
    Add {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "Arduino Nano")]
        device_type: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value_t = 100)]
        capacity: u32,
    },
    /// List all devices
    List,
    /// Show one device with its totals
    Show { id: i64 },
    /// Include a device in the simulation
    Activate { id: i64 },
    /// Exclude a device from the simulation
    Deactivate { id: i64 },
    /// Delete a device with all its events and readings
    Remove { id: i64 },
    /// Delete all events of a device
    Clear { id: i64 },
}

#[derive(Subcommand, Debug)]
enum AlertsCommand {
    /// Print the current settings
    Show,
    /// Change individual settings
    Set {
        #[arg(long)]
        disconnection: Option<bool>,

        #[arg(long)]
        low_occupancy: Option<bool>,

        /// Percentage of capacity
        #[arg(long)]
        low_threshold: Option<u32>,

        #[arg(long)]
        high_occupancy: Option<bool>,

        /// Percentage of capacity
        #[arg(long)]
        high_threshold: Option<u32>,

        #[arg(long)]
        traffic_peak: Option<bool>,

        /// Entries within the traffic window
        #[arg(long)]
        traffic_threshold: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create an account
    Register {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Check credentials and open a session
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let filter = if args.trace {
        EnvFilter::new("trace")
    } else if args.debug {
        EnvFilter::new("debug")
    } else if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Footfall v{}", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    let db = Database::open(&config.database)?;

    match args.command {
        Command::Run { cycles } => {
            let rt = tokio::runtime::Runtime::new()?;
            match cycles {
                Some(cycles) => rt.block_on(run_cycles(config, db, cycles)),
                None => rt.block_on(run_engine(config, db)),
            }
        }
        Command::Device(cmd) => device_command(&db, cmd),
        Command::Events { device_id, limit } => {
            let device = db.require_device(device_id)?;
            let events = db.recent_events(device_id, limit)?;
            println!("{} events for '{}' (newest first)", events.len(), device.name);
            for event in events {
                println!(
                    "{:>6}  {}  {:<13} {}",
                    event.id,
                    event
                        .timestamp
                        .with_timezone(&chrono::Local)
                        .format("%d/%m/%Y %H:%M:%S"),
                    event.event_type,
                    event.people_count
                );
            }
            Ok(())
        }
        Command::Report {
            device_id,
            range,
            json,
        } => {
            let report = ReportService::new(db).device_report(device_id, range)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let mut out = std::io::stdout();
                EventExporter::new(config.export.format).write_summary(&report, &mut out)?;
            }
            Ok(())
        }
        Command::Export {
            device_id,
            range,
            format,
            summary,
            output,
        } => {
            let report = ReportService::new(db).device_report(device_id, range)?;
            let exporter = EventExporter::new(format.unwrap_or(config.export.format));
            let dir = output.unwrap_or_else(|| config.export.path.clone());

            let path = exporter.export_to_file(&dir, &report)?;
            println!("Exported {} events to {}", report.events.len(), path.display());
            if summary {
                let path = exporter.export_summary_to_file(&dir, &report)?;
                println!("Summary written to {}", path.display());
            }
            Ok(())
        }
        Command::Alerts(cmd) => alerts_command(&db, cmd),
        Command::User(cmd) => user_command(&db, &config, cmd),
        Command::Cleanup { days } => {
            let days = days.unwrap_or(config.database.retention_days);
            let removed = db.cleanup(days)?;
            println!("Removed {} rows older than {} days", removed, days);
            Ok(())
        }
        Command::Stats => {
            let stats = db.get_stats()?;
            println!("Users:     {}", stats.user_count);
            println!("Devices:   {}", stats.device_count);
            println!("Events:    {}", stats.event_count);
            println!("Readings:  {}", stats.reading_count);
            println!("Size:      {} KiB", stats.size_bytes / 1024);
            println!();
            for summary in ReportService::new(db).device_summaries()? {
                println!(
                    "#{:<4} {:<24} {:>3}  in {:>6}  out {:>6}  now {:>4}/{:<4} ({:.0}%)",
                    summary.device_id,
                    summary.name,
                    if summary.is_active { "on" } else { "off" },
                    summary.entered,
                    summary.left,
                    summary.occupancy,
                    summary.capacity,
                    summary.occupancy_percent()
                );
            }
            Ok(())
        }
    }
}

fn device_command(db: &Database, cmd: DeviceCommand) -> Result<()> {
    match cmd {
        DeviceCommand::Add {
            name,
            device_type,
            location,
            capacity,
        } => {
            let device = db.insert_device(&NewDevice {
                name,
                device_type,
                location,
                capacity,
            })?;
            println!(
                "Added device #{} '{}' ({})",
                device.id, device.name, device.mac_address
            );
        }
        DeviceCommand::List => {
            for device in db.list_devices()? {
                println!(
                    "#{:<4} {:<24} {:<14} cap {:<5} {:<8} {}",
                    device.id,
                    device.name,
                    device.device_type,
                    device.capacity,
                    if device.is_active {
                        "active"
                    } else {
                        "inactive"
                    },
                    device.location
                );
            }
        }
        DeviceCommand::Show { id } => {
            let device = db.require_device(id)?;
            let entered = db.total_entered(id)?;
            let left = db.total_left(id)?;
            println!("Device #{}: {}", device.id, device.name);
            println!("  Type:      {}", device.device_type);
            println!("  MAC:       {}", device.mac_address);
            println!("  Location:  {}", device.location);
            println!("  Capacity:  {}", device.capacity);
            println!("  Active:    {}", device.is_active);
            println!("  Created:   {}", device.created_at.to_rfc3339());
            println!("  Entered:   {}", entered);
            println!("  Left:      {}", left);
            println!("  Occupancy: {}", entered.saturating_sub(left));
            if let Some(event) = db.latest_event(id)? {
                println!(
                    "  Last:      {} x{} at {}",
                    event.event_type,
                    event.people_count,
                    event.timestamp.to_rfc3339()
                );
            }
        }
        DeviceCommand::Activate { id } => {
            db.set_device_active(id, true)?;
            println!("Device #{} activated", id);
        }
        DeviceCommand::Deactivate { id } => {
            db.set_device_active(id, false)?;
            println!("Device #{} deactivated", id);
        }
        DeviceCommand::Remove { id } => {
            db.delete_device(id)?;
            println!("Device #{} removed", id);
        }
        DeviceCommand::Clear { id } => {
            db.require_device(id)?;
            let removed = db.delete_events_for_device(id)?;
            println!("Removed {} events of device #{}", removed, id);
        }
    }
    Ok(())
}

fn alerts_command(db: &Database, cmd: AlertsCommand) -> Result<()> {
    let mut settings = db.alert_settings()?;

    if let AlertsCommand::Set {
        disconnection,
        low_occupancy,
        low_threshold,
        high_occupancy,
        high_threshold,
        traffic_peak,
        traffic_threshold,
    } = cmd
    {
        let old = settings.clone();
        settings = AlertSettings {
            disconnection_enabled: disconnection.unwrap_or(old.disconnection_enabled),
            low_occupancy_enabled: low_occupancy.unwrap_or(old.low_occupancy_enabled),
            low_occupancy_threshold: low_threshold.unwrap_or(old.low_occupancy_threshold),
            high_occupancy_enabled: high_occupancy.unwrap_or(old.high_occupancy_enabled),
            high_occupancy_threshold: high_threshold.unwrap_or(old.high_occupancy_threshold),
            traffic_peak_enabled: traffic_peak.unwrap_or(old.traffic_peak_enabled),
            traffic_peak_threshold: traffic_threshold.unwrap_or(old.traffic_peak_threshold),
        };
        db.save_alert_settings(&settings)?;
        println!("Alert settings saved");
    }

    let flag = |on: bool| if on { "on " } else { "off" };
    println!("Disconnection   {}", flag(settings.disconnection_enabled));
    println!(
        "Low occupancy   {}  below {}%",
        flag(settings.low_occupancy_enabled),
        settings.low_occupancy_threshold
    );
    println!(
        "High occupancy  {}  at {}%",
        flag(settings.high_occupancy_enabled),
        settings.high_occupancy_threshold
    );
    println!(
        "Traffic peak    {}  {} entries",
        flag(settings.traffic_peak_enabled),
        settings.traffic_peak_threshold
    );
    Ok(())
}

fn user_command(db: &Database, config: &Config, cmd: UserCommand) -> Result<()> {
    let audit = Arc::new(AuditLog::new(config.security.audit_log_size));
    let mut auth = AuthManager::new(config.security.clone(), audit);

    match cmd {
        UserCommand::Register { username, password } => {
            auth.register(db, &username, &password)?;
            println!("User '{}' registered", username.trim());
        }
        UserCommand::Login { username, password } => {
            let session = auth.login(db, &username, &password)?;
            println!(
                "Logged in as '{}', session {} valid until {}",
                session.username,
                session.id,
                session.expires_at.to_rfc3339()
            );
        }
    }
    Ok(())
}

/// Run a fixed number of cycles without waiting between them
async fn run_cycles(config: Config, db: Database, cycles: u64) -> Result<()> {
    let bus = Arc::new(EventBus::default());
    let mut simulation = SimulationService::new(db, &config, bus);

    let (mut events, mut alerts, mut errors) = (0usize, 0usize, 0usize);
    for _ in 0..cycles {
        let report = simulation.tick().await?;
        for event in &report.events {
            println!(
                "device #{}: {} x{}",
                event.device_id, event.event_type, event.people_count
            );
        }
        for alert in &report.alerts {
            println!("ALERT [{:?}] {}: {}", alert.severity, alert.title, alert.message);
        }
        events += report.events.len();
        alerts += report.alerts.len();
        errors += report.errors;
    }

    println!(
        "{} cycles: {} events, {} alerts, {} errors",
        cycles, events, alerts, errors
    );
    Ok(())
}

/// Run the engine in the background until Ctrl+C
async fn run_engine(config: Config, db: Database) -> Result<()> {
    let mut engine = Engine::new(config, db);
    engine.start().await?;

    info!("Footfall running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, cleaning up...");

    engine.stop().await?;

    let state = engine.state().await;
    println!(
        "Processed {} events and {} alerts across {} devices in {}s",
        state.total_events, state.total_alerts, state.active_devices, state.uptime_seconds
    );
    Ok(())
}
