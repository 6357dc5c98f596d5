// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Domain errors callers are expected to match on

use thiserror::Error;

/// Failures of domain rules, as opposed to I/O or database errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CounterError {
    #[error("device name must not be empty")]
    EmptyDeviceName,

    #[error("device capacity must be greater than 0")]
    InvalidCapacity,

    #[error("device {0} not found")]
    DeviceNotFound(i64),

    #[error("user already exists")]
    UserExists,

    #[error("{0}")]
    WeakPassword(String),

    /// Deliberately the same for unknown users and wrong passwords
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("too many failed attempts, try again later")]
    LockedOut,

    #[error("invalid alert settings: {0}")]
    InvalidAlertSettings(String),
}
