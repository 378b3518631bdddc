// SPDX-License-Identifier: GPL-3.0-only

//! Scanner state types

use crate::errors::{EncodingError, SubmissionError};
use serde_json::Value;
use std::time::Instant;

/// Scan trigger state machine
///
/// `Idle → Scanning → (Decoded | Error) → Idle`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScanPhase {
    /// No decode loop is active
    #[default]
    Idle,
    /// A decode loop is attached to a device stream
    Scanning {
        /// Device being scanned
        device_id: String,
        /// When the loop started
        started_at: Instant,
    },
    /// A code was decoded and is being submitted
    Decoded,
    /// The last attempt failed; the user may retry
    Error,
}

impl ScanPhase {
    pub fn is_scanning(&self) -> bool {
        matches!(self, ScanPhase::Scanning { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ScanPhase::Idle)
    }

    /// Device currently being scanned
    pub fn device_id(&self) -> Option<&str> {
        match self {
            ScanPhase::Scanning { device_id, .. } => Some(device_id),
            _ => None,
        }
    }

    /// Seconds spent scanning so far
    pub fn elapsed_secs(&self) -> u64 {
        match self {
            ScanPhase::Scanning { started_at, .. } => started_at.elapsed().as_secs(),
            _ => 0,
        }
    }
}

/// Result of mounting the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationOutcome {
    /// Devices were listed and a default selected
    Ready { count: usize },
    /// No camera subsystem
    Unsupported,
    /// Camera access refused
    PermissionDenied,
    /// Access granted but nothing listed
    NoDevices,
}

impl EnumerationOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, EnumerationOutcome::Ready { .. })
    }
}

/// Result of pressing the scan trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A decode loop started on this device
    Started { device_id: String },
    /// Nothing is selected; no loop started
    NoDeviceSelected,
    /// A loop is already running; no second loop started
    AlreadyScanning,
    /// The loop thread could not be started
    Failed(String),
}

/// Result of submitting a decoded payload
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The service answered successfully
    Submitted(Value),
    /// The text could not be encoded; nothing was sent
    NotEncodable(EncodingError),
    /// The service could not be reached or rejected the payload
    Failed(SubmissionError),
}

/// Result of a full trigger, decode and submit cycle
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The trigger did not start a loop
    NotStarted(TriggerOutcome),
    /// The loop ended without a decode (stream failure or cancel)
    NoResult,
    /// A code was decoded and submission was attempted
    Completed(SubmitOutcome),
}
