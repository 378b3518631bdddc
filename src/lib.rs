// SPDX-License-Identifier: GPL-3.0-only

//! qrscan - scan QR codes from a camera and submit them to a decode service
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The scanner page, its state machine and QR detection
//! - [`backends`]: Camera backend abstraction (V4L2, still images)
//! - [`decode_service`]: HTTP client for the remote decode endpoint
//! - [`media`]: Greyscale conversion and single-byte text encoding
//! - [`config`]: User configuration handling
//! - [`terminal`]: Interactive terminal front end

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod decode_service;
pub mod errors;
pub mod media;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{QrDetection, QrDetector};
pub use app::{Notice, Notifier, ScannerPage};
pub use config::{Config, TokenSource};
pub use decode_service::{DecodeServiceClient, DryRun, Submitter};
pub use errors::{AppError, AppResult};
