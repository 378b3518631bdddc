// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! A [`FrameDecoder`] turns one frame into at most one QR detection. The
//! decode loop calls it for every frame until it succeeds.

pub mod qr_detector;

pub use qr_detector::QrDetector;

use crate::app::frame_processor::types::QrDetection;
use crate::backends::camera::types::CameraFrame;
use crate::errors::DecodeError;

/// Per-frame decoder used by the decode loop
pub trait FrameDecoder: Send + Sync {
    /// Decode the first readable QR code in the frame
    fn decode(&self, frame: &CameraFrame) -> Result<QrDetection, DecodeError>;
}
