// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module
//!
//! Per-frame analysis run by the decode loop. Currently implements QR code
//! detection.

pub mod tasks;
pub mod types;

pub use tasks::{FrameDecoder, QrDetector, qr_detector};
pub use types::{FrameRegion, QrDetection};
