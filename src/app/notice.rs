// SPDX-License-Identifier: GPL-3.0-only

//! User-visible notices
//!
//! Everything the scanner wants the user to see goes through a
//! [`Notifier`], one notice per event. Per-frame decode misses are never
//! notices; they only reach the log.

use serde_json::Value;
use std::sync::Arc;

/// Something the user must be told about
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The host has no camera subsystem
    Unsupported,
    /// Camera access was refused
    PermissionDenied,
    /// Access worked but no camera was listed
    NoDevicesFound,
    /// The decode service answered; shown verbatim
    Response(Value),
    /// The decode service answered with an error status
    SubmissionFailed { status: u16, body: Value },
    /// The decode service could not be reached
    TransportFailed(String),
    /// The decoded text has no single-byte form
    EncodingFailed(String),
    /// The camera stream failed while scanning
    ScanFailed(String),
}

impl Notice {
    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            Notice::Unsupported => "This system does not support camera capture".to_string(),
            Notice::PermissionDenied => {
                "The application cannot be used without camera permission".to_string()
            }
            Notice::NoDevicesFound => "No camera devices found".to_string(),
            Notice::Response(value) => value.to_string(),
            Notice::SubmissionFailed { status, body } => {
                serde_json::json!({ "status": status, "data": body }).to_string()
            }
            Notice::TransportFailed(msg) => format!("Could not reach the decode service: {}", msg),
            Notice::EncodingFailed(msg) => format!("QR payload cannot be sent: {}", msg),
            Notice::ScanFailed(msg) => format!("Scanning stopped: {}", msg),
        }
    }

    /// Whether this notice reports a failure
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Response(_))
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Surface for user-visible notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Prints notices to the terminal
///
/// Responses go to stdout so they can be piped; failures go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::Response(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                println!("{}", pretty);
            }
            other => eprintln!("{}", other.message()),
        }
    }
}
