// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Data export - CSV, JSON lines and plain-text summaries

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::DeviceReport;
use crate::sensors::{Device, EventType, SensorEvent};

pub const CSV_HEADER: [&str; 7] = [
    "Event ID",
    "Device Name",
    "Event Type",
    "People Count",
    "Date",
    "Time",
    "Timestamp",
];

/// Export format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "jsonl",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" | "jsonl" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

#[derive(Serialize)]
struct ExportedEvent<'a> {
    id: i64,
    device_id: i64,
    device_name: &'a str,
    event_type: EventType,
    people_count: u32,
    timestamp: DateTime<Utc>,
}

/// Writes a device's events and reports
pub struct EventExporter {
    format: ExportFormat,
}

impl EventExporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn write_events<W: Write>(
        &self,
        device: &Device,
        events: &[SensorEvent],
        writer: &mut W,
    ) -> Result<()> {
        match self.format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(&mut *writer);
                wtr.write_record(CSV_HEADER)?;
                for event in events {
                    let local = event.timestamp.with_timezone(&Local);
                    wtr.write_record([
                        event.id.to_string(),
                        device.name.clone(),
                        event.event_type.to_string(),
                        event.people_count.to_string(),
                        local.format("%d/%m/%Y").to_string(),
                        local.format("%H:%M:%S").to_string(),
                        event.timestamp.timestamp_millis().to_string(),
                    ])?;
                }
                wtr.flush()?;
            }
            ExportFormat::Json => {
                for event in events {
                    let line = serde_json::to_string(&ExportedEvent {
                        id: event.id,
                        device_id: event.device_id,
                        device_name: &device.name,
                        event_type: event.event_type,
                        people_count: event.people_count,
                        timestamp: event.timestamp,
                    })?;
                    writeln!(writer, "{}", line)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Plain-text report for one device and range
    pub fn write_summary<W: Write>(&self, report: &DeviceReport, writer: &mut W) -> Result<()> {
        let stats = &report.stats;
        let local = |ts: DateTime<Utc>| ts.with_timezone(&Local).format("%d/%m/%Y %H:%M");

        writeln!(writer, "Footfall report")?;
        writeln!(writer, "===============")?;
        writeln!(writer, "Device:          {}", report.device.name)?;
        if !report.device.location.is_empty() {
            writeln!(writer, "Location:        {}", report.device.location)?;
        }
        writeln!(writer, "Capacity:        {}", report.device.capacity)?;
        writeln!(
            writer,
            "Range:           {} ({} - {})",
            report.range,
            local(report.start),
            local(report.end)
        )?;
        writeln!(writer)?;
        writeln!(writer, "Entries:         {}", stats.total_entries)?;
        writeln!(writer, "Exits:           {}", stats.total_exits)?;
        writeln!(writer, "Disconnections:  {}", stats.disconnections)?;
        writeln!(writer, "Current:         {}", stats.current_occupancy)?;
        writeln!(writer, "Peak:            {}", stats.peak_occupancy)?;
        writeln!(writer, "Average dwell:   {} min", stats.avg_dwell_minutes)?;
        writeln!(writer, "Events:          {}", report.events.len())?;
        writeln!(
            writer,
            "Generated:       {}",
            Local::now().format("%d/%m/%Y %H:%M:%S")
        )?;

        writer.flush()?;
        Ok(())
    }

    /// Write the report's events into `dir` under a timestamped name
    pub fn export_to_file(&self, dir: &Path, report: &DeviceReport) -> Result<PathBuf> {
        let path = self.create_path(dir, &report.device, self.format.extension())?;
        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("creating export file {:?}", path))?,
        );
        self.write_events(&report.device, &report.events, &mut writer)?;

        info!("Exported {} events to {:?}", report.events.len(), path);
        Ok(path)
    }

    pub fn export_summary_to_file(&self, dir: &Path, report: &DeviceReport) -> Result<PathBuf> {
        let path = self.create_path(dir, &report.device, "txt")?;
        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("creating summary file {:?}", path))?,
        );
        self.write_summary(report, &mut writer)?;

        info!("Wrote summary to {:?}", path);
        Ok(path)
    }

    fn create_path(&self, dir: &Path, device: &Device, ext: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating export directory {:?}", dir))?;

        let slug: String = device
            .name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");

        Ok(dir.join(format!("footfall_{}_{}.{}", slug, timestamp, ext)))
    }
}
