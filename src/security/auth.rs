// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Authentication and session management

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    hash_password, validate_password, verify_password, AuditLog, AuditSeverity, SecurityEventType,
};
use crate::config::{SecurityConfig, MAX_DURATION_SECS};
use crate::db::{Database, User};
use crate::error::CounterError;

/// Authentication manager
pub struct AuthManager {
    config: SecurityConfig,

    /// Active sessions
    sessions: HashMap<String, Session>,

    /// Failed login attempts per username: count and time of the last one
    failed_attempts: HashMap<String, (u32, DateTime<Utc>)>,

    audit: Arc<AuditLog>,
}

/// User session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl AuthManager {
    pub fn new(config: SecurityConfig, audit: Arc<AuditLog>) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            failed_attempts: HashMap::new(),
            audit,
        }
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    fn lockout_duration(&self) -> Duration {
        let max_minutes = (MAX_DURATION_SECS / 60) as i64;
        Duration::minutes(self.config.lockout_minutes.clamp(0, max_minutes))
    }

    fn session_timeout(&self) -> Duration {
        Duration::seconds(self.config.session_timeout_secs.min(MAX_DURATION_SECS) as i64)
    }

    /// Create an account after checking the username and password rules
    pub fn register(&mut self, db: &Database, username: &str, password: &str) -> Result<()> {
        let username = username.trim();

        if db.get_user(username)?.is_some() {
            self.audit.log(
                SecurityEventType::RegistrationFailure,
                AuditSeverity::Warning,
                Some(username),
                "registration rejected: user exists",
            );
            return Err(CounterError::UserExists.into());
        }

        if let Err(e) = validate_password(password, self.config.min_password_length) {
            self.audit.log(
                SecurityEventType::RegistrationFailure,
                AuditSeverity::Warning,
                Some(username),
                format!("registration rejected: {}", e),
            );
            return Err(e.into());
        }

        db.insert_user(&User {
            username: username.to_string(),
            password_hash: hash_password(password),
        })?;

        self.audit.log(
            SecurityEventType::ConfigChange,
            AuditSeverity::Info,
            Some(username),
            "user registered",
        );
        Ok(())
    }

    /// Check credentials and open a session.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub fn login(&mut self, db: &Database, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();

        if self.is_locked_out(username) {
            self.audit.log(
                SecurityEventType::LoginFailure,
                AuditSeverity::Warning,
                Some(username),
                "login refused: locked out",
            );
            return Err(CounterError::LockedOut.into());
        }

        let valid = db
            .get_user(username)?
            .map(|user| verify_password(password, &user.password_hash))
            .unwrap_or(false);

        if !valid {
            let attempts = self.record_failed_attempt(username);
            self.audit.log(
                SecurityEventType::LoginFailure,
                AuditSeverity::Warning,
                Some(username),
                format!("invalid credentials (attempt {})", attempts),
            );
            if attempts == self.config.lockout_threshold {
                self.audit.log(
                    SecurityEventType::Critical,
                    AuditSeverity::Critical,
                    Some(username),
                    format!(
                        "locked out for {} minutes after {} failed attempts",
                        self.config.lockout_minutes, attempts
                    ),
                );
            }
            return Err(CounterError::InvalidCredentials.into());
        }

        self.clear_failed_attempts(username);
        let session = self.create_session(username);
        self.audit.log(
            SecurityEventType::LoginSuccess,
            AuditSeverity::Info,
            Some(username),
            "login succeeded",
        );
        Ok(session)
    }

    pub fn logout(&mut self, session_id: &str) -> bool {
        let username = self.sessions.get(session_id).map(|s| s.username.clone());
        let invalidated = self.invalidate_session(session_id);
        if invalidated {
            self.audit.log(
                SecurityEventType::Logout,
                AuditSeverity::Info,
                username.as_deref(),
                "logged out",
            );
        }
        invalidated
    }

    /// Check if user is locked out
    pub fn is_locked_out(&self, username: &str) -> bool {
        if let Some((attempts, last_attempt)) = self.failed_attempts.get(username) {
            if *attempts >= self.config.lockout_threshold {
                let lockout_end = *last_attempt + self.lockout_duration();
                if Utc::now() < lockout_end {
                    return true;
                }
            }
        }
        false
    }

    /// Record a failure and return the count within the current window
    fn record_failed_attempt(&mut self, username: &str) -> u32 {
        let now = Utc::now();
        let window = self.lockout_duration();
        let entry = self
            .failed_attempts
            .entry(username.to_string())
            .or_insert((0, now));

        if now - entry.1 > window {
            entry.0 = 0;
        }
        entry.0 += 1;
        entry.1 = now;
        entry.0
    }

    fn clear_failed_attempts(&mut self, username: &str) {
        self.failed_attempts.remove(username);
    }

    fn create_session(&mut self, username: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.session_timeout(),
            is_active: true,
        };

        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Validate session
    pub fn validate_session(&self, session_id: &str) -> Option<&Session> {
        self.sessions
            .get(session_id)
            .filter(|session| session.is_active && session.expires_at > Utc::now())
    }

    /// Invalidate session
    pub fn invalidate_session(&mut self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) if session.is_active => {
                session.is_active = false;
                true
            }
            _ => false,
        }
    }

    /// Drop expired and invalidated sessions, returning how many went
    pub fn cleanup_sessions(&mut self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.is_active && session.expires_at > now);
        before - self.sessions.len()
    }

    pub fn active_session_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .values()
            .filter(|s| s.is_active && s.expires_at > now)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, AuthManager) {
        let db = Database::open_in_memory().unwrap();
        let auth = AuthManager::new(SecurityConfig::default(), Arc::new(AuditLog::default()));
        (db, auth)
    }

    #[test]
    fn test_register_and_login() {
        let (db, mut auth) = setup();
        auth.register(&db, "ana", "Secret!23").unwrap();

        let stored = db.get_user("ana").unwrap().unwrap();
        assert_eq!(stored.password_hash, hash_password("Secret!23"));

        let session = auth.login(&db, "ana", "Secret!23").unwrap();
        assert_eq!(session.username, "ana");
        assert!(auth.validate_session(&session.id).is_some());
    }

    #[test]
    fn test_register_rejects_duplicates_and_weak_passwords() {
        let (db, mut auth) = setup();
        auth.register(&db, "ana", "Secret!23").unwrap();

        let err = auth.register(&db, "ana", "Other!234").unwrap_err();
        assert_eq!(err.downcast_ref::<CounterError>(), Some(&CounterError::UserExists));

        let err = auth.register(&db, "bob", "weak").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CounterError>(),
            Some(CounterError::WeakPassword(_))
        ));
        assert_eq!(auth.audit().len(), 3);
    }

    #[test]
    fn test_unknown_user_and_wrong_password_fail_the_same() {
        let (db, mut auth) = setup();
        auth.register(&db, "ana", "Secret!23").unwrap();

        let wrong = auth.login(&db, "ana", "Secret!24").unwrap_err();
        let unknown = auth.login(&db, "nobody", "Secret!23").unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(
            wrong.downcast_ref::<CounterError>(),
            Some(&CounterError::InvalidCredentials)
        );
    }

    #[test]
    fn test_lockout_after_threshold() {
        let (db, mut auth) = setup();
        auth.register(&db, "ana", "Secret!23").unwrap();

        for _ in 0..5 {
            assert!(auth.login(&db, "ana", "nope").is_err());
        }
        assert!(auth.is_locked_out("ana"));

        // even the right password is refused while locked out
        let err = auth.login(&db, "ana", "Secret!23").unwrap_err();
        assert_eq!(err.downcast_ref::<CounterError>(), Some(&CounterError::LockedOut));
        assert_eq!(auth.audit().failed_login_count(Duration::hours(1)), 6);
    }

    #[test]
    fn test_lockout_expires() {
        let db = Database::open_in_memory().unwrap();
        let config = SecurityConfig {
            lockout_minutes: 0,
            ..SecurityConfig::default()
        };
        let mut auth = AuthManager::new(config, Arc::new(AuditLog::default()));
        auth.register(&db, "ana", "Secret!23").unwrap();

        for _ in 0..5 {
            assert!(auth.login(&db, "ana", "nope").is_err());
        }
        assert!(!auth.is_locked_out("ana"));
        assert!(auth.login(&db, "ana", "Secret!23").is_ok());
    }

    #[test]
    fn test_oversized_durations_are_capped() {
        let db = Database::open_in_memory().unwrap();
        let config = SecurityConfig {
            lockout_minutes: i64::MAX,
            session_timeout_secs: u64::MAX,
            ..SecurityConfig::default()
        };
        let mut auth = AuthManager::new(config, Arc::new(AuditLog::default()));
        auth.register(&db, "ana", "Secret!23").unwrap();

        let session = auth.login(&db, "ana", "Secret!23").unwrap();
        let lifetime = session.expires_at - session.created_at;
        assert_eq!(lifetime, Duration::seconds(MAX_DURATION_SECS as i64));

        for _ in 0..5 {
            assert!(auth.login(&db, "ana", "nope").is_err());
        }
        assert!(auth.is_locked_out("ana"));
    }

    #[test]
    fn test_session_management() {
        let (db, mut auth) = setup();
        auth.register(&db, "ana", "Secret!23").unwrap();
        let session = auth.login(&db, "ana", "Secret!23").unwrap();

        assert_eq!(auth.active_session_count(), 1);
        assert!(auth.logout(&session.id));
        assert!(!auth.logout(&session.id));
        assert!(auth.validate_session(&session.id).is_none());
        assert_eq!(auth.cleanup_sessions(), 1);
    }
}
