// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! Frames are reduced to luma, optionally downscaled, and searched for
//! QR symbols. Payloads are returned as raw bytes and read as ISO-8859-1,
//! so binary payloads survive the trip to the decode service unchanged.

use super::FrameDecoder;
use crate::app::frame_processor::types::{FrameRegion, QrDetection};
use crate::backends::camera::types::CameraFrame;
use crate::constants::detection;
use crate::errors::DecodeError;
use crate::media::LumaImage;
use tracing::{debug, trace};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: detection::DEFAULT_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(detection::MIN_MAX_DIMENSION),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Detect every readable QR code in a frame
    ///
    /// Symbols that are located but fail to decode are logged and skipped.
    pub fn detect(&self, frame: &CameraFrame) -> Result<Vec<QrDetection>, DecodeError> {
        let start = std::time::Instant::now();

        let luma = LumaImage::from_frame(frame)?;
        let (frame_width, frame_height) = (luma.width, luma.height);
        let (luma, scale) = luma.fit_within(self.max_dimension);

        trace!(
            proc_width = luma.width,
            proc_height = luma.height,
            scale,
            conversion_ms = start.elapsed().as_millis(),
            "Prepared luma image for processing"
        );

        let width = luma.width as usize;
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, luma.height as usize, |x, y| {
                luma.data[y * width + x]
            });
        let grids = prepared.detect_grids();

        if grids.is_empty() {
            return Err(DecodeError::NoCode);
        }

        let mut detections = Vec::with_capacity(grids.len());
        let mut last_error = None;

        for grid in grids {
            let mut payload = Vec::new();
            let meta = match grid.decode_to(&mut payload) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR code");
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            let xs = grid.bounds.iter().map(|p| p.x);
            let ys = grid.bounds.iter().map(|p| p.y);
            let min_x = xs.clone().min().unwrap_or(0).max(0) as f32;
            let max_x = xs.max().unwrap_or(0).max(0) as f32;
            let min_y = ys.clone().min().unwrap_or(0).max(0) as f32;
            let max_y = ys.max().unwrap_or(0).max(0) as f32;

            // Scale back to original frame coordinates
            let x = ((min_x * scale) as u32).min(frame_width);
            let y = ((min_y * scale) as u32).min(frame_height);
            let w = (((max_x - min_x) * scale) as u32).min(frame_width - x);
            let h = (((max_y - min_y) * scale) as u32).min(frame_height - y);

            let region = FrameRegion::from_pixels(x, y, w, h, frame_width, frame_height);
            let detection = QrDetection::from_payload(region, payload).with_version(meta.version.0);

            debug!(
                bytes = detection.payload.len(),
                version = meta.version.0,
                x = detection.bounds.x,
                y = detection.bounds.y,
                "Detected QR code"
            );
            detections.push(detection);
        }

        if detections.is_empty() {
            return Err(DecodeError::Unreadable(
                last_error.unwrap_or_else(|| "no decodable grid".to_string()),
            ));
        }

        debug!(
            count = detections.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
        Ok(detections)
    }
}

impl FrameDecoder for QrDetector {
    fn decode(&self, frame: &CameraFrame) -> Result<QrDetection, DecodeError> {
        self.detect(frame)?
            .into_iter()
            .next()
            .ok_or(DecodeError::NoCode)
    }
}
