// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results

use crate::media::latin1;

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }

    /// Region covering the whole frame
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// A successfully decoded QR code
#[derive(Debug, Clone, PartialEq)]
pub struct QrDetection {
    /// Bounding box of the QR code in normalized frame coordinates
    pub bounds: FrameRegion,
    /// Payload read as ISO-8859-1 text, one character per byte
    pub content: String,
    /// Raw payload bytes as stored in the symbol
    pub payload: Vec<u8>,
    /// QR version (1-40) when known
    pub version: Option<usize>,
}

impl QrDetection {
    /// Build a detection from the raw bytes of a symbol
    pub fn from_payload(bounds: FrameRegion, payload: Vec<u8>) -> Self {
        Self {
            bounds,
            content: latin1::decode(&payload),
            payload,
            version: None,
        }
    }

    pub fn with_version(mut self, version: usize) -> Self {
        self.version = Some(version);
        self
    }

    /// Payload as lowercase hex, for logs and dry runs
    pub fn payload_hex(&self) -> String {
        self.payload.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_pixels() {
        let region = FrameRegion::from_pixels(160, 120, 320, 240, 640, 480);
        assert_eq!(region.x, 0.25);
        assert_eq!(region.y, 0.25);
        assert_eq!(region.width, 0.5);
        assert_eq!(region.height, 0.5);
    }

    #[test]
    fn test_detection_content_matches_payload() {
        let detection = QrDetection::from_payload(FrameRegion::full(), vec![0x48, 0xE9, 0xFF]);
        assert_eq!(detection.content, "Hé\u{FF}");
        assert_eq!(detection.payload_hex(), "48e9ff");
    }
}
