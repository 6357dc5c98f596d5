// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Bounded in-memory security audit log

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;
use tracing::{error, info, warn};

pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityEventType {
    LoginSuccess,
    LoginFailure,
    Logout,
    RegistrationFailure,
    ConfigChange,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: SecurityEventType,
    pub severity: AuditSeverity,
    pub username: Option<String>,
    pub description: String,
}

/// Counts over the retained events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReport {
    pub total_events: usize,
    pub by_type: BTreeMap<SecurityEventType, usize>,
    pub failed_logins_last_hour: usize,
    pub critical_events: usize,
}

pub struct AuditLog {
    events: RwLock<VecDeque<SecurityEvent>>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    pub fn log(
        &self,
        event_type: SecurityEventType,
        severity: AuditSeverity,
        username: Option<&str>,
        description: impl Into<String>,
    ) {
        self.record(SecurityEvent {
            timestamp: Utc::now(),
            event_type,
            severity,
            username: username.map(str::to_string),
            description: description.into(),
        });
    }

    pub fn record(&self, event: SecurityEvent) {
        let user = event.username.as_deref().unwrap_or("-");
        match event.severity {
            AuditSeverity::Info => {
                info!(event_type = ?event.event_type, user, "Audit: {}", event.description)
            }
            AuditSeverity::Warning => {
                warn!(event_type = ?event.event_type, user, "Audit: {}", event.description)
            }
            AuditSeverity::Error | AuditSeverity::Critical => {
                error!(event_type = ?event.event_type, user, "Audit: {}", event.description)
            }
        }

        let mut events = self.events.write();
        events.push_back(event);
        while events.len() > self.capacity {
            events.pop_front();
        }
    }

    /// Newest first
    pub fn events(&self, limit: usize) -> Vec<SecurityEvent> {
        self.events.read().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Failed logins within `window` of now
    pub fn failed_login_count(&self, window: Duration) -> usize {
        let since = Utc::now() - window;
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == SecurityEventType::LoginFailure && e.timestamp >= since)
            .count()
    }

    pub fn report(&self) -> AuditReport {
        let events = self.events.read();
        let mut by_type = BTreeMap::new();
        for event in events.iter() {
            *by_type.entry(event.event_type).or_insert(0) += 1;
        }
        let critical_events = events
            .iter()
            .filter(|e| e.severity == AuditSeverity::Critical)
            .count();
        drop(events);

        AuditReport {
            total_events: self.len(),
            by_type,
            failed_logins_last_hour: self.failed_login_count(Duration::hours(1)),
            critical_events,
        }
    }

    /// One line per event, oldest first
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for event in self.events.read().iter() {
            let _ = writeln!(
                out,
                "{} [{:?}] {:?} user={} {}",
                event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                event.severity,
                event.event_type,
                event.username.as_deref().unwrap_or("-"),
                event.description
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let log = AuditLog::new(3);
        for i in 0..5 {
            log.log(
                SecurityEventType::ConfigChange,
                AuditSeverity::Info,
                None,
                format!("change {}", i),
            );
        }
        assert_eq!(log.len(), 3);
        let newest = log.events(1);
        assert_eq!(newest[0].description, "change 4");
    }

    #[test]
    fn test_report_counts() {
        let log = AuditLog::default();
        log.log(SecurityEventType::LoginFailure, AuditSeverity::Warning, Some("ana"), "bad");
        log.log(SecurityEventType::LoginFailure, AuditSeverity::Warning, Some("ana"), "bad");
        log.log(SecurityEventType::LoginSuccess, AuditSeverity::Info, Some("ana"), "ok");
        log.log(SecurityEventType::Critical, AuditSeverity::Critical, Some("ana"), "locked");

        let report = log.report();
        assert_eq!(report.total_events, 4);
        assert_eq!(report.failed_logins_last_hour, 2);
        assert_eq!(report.critical_events, 1);
        assert_eq!(report.by_type.get(&SecurityEventType::LoginFailure), Some(&2));
    }

    #[test]
    fn test_export_text() {
        let log = AuditLog::default();
        log.log(SecurityEventType::Logout, AuditSeverity::Info, Some("ana"), "signed out");
        let text = log.export_text();
        assert!(text.contains("Logout"));
        assert!(text.contains("user=ana"));
        assert!(text.ends_with("signed out\n"));
    }
}
