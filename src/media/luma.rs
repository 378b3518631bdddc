// SPDX-License-Identifier: GPL-3.0-only

//! Greyscale conversion for QR detection
//!
//! Detection only needs luminance, so every supported pixel format is
//! reduced to a tightly packed 8-bit luma plane (stride padding removed).

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::DecodeError;

/// Tightly packed 8-bit greyscale image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LumaImage {
    /// Convert a camera frame to luma
    pub fn from_frame(frame: &CameraFrame) -> Result<Self, DecodeError> {
        let (bpp, convert): (usize, RowConverter) = match frame.format {
            PixelFormat::Mjpeg => return decode_mjpeg(frame),
            PixelFormat::Gray8 => (1, gray_row),
            PixelFormat::Yuyv => (2, yuyv_row),
            PixelFormat::Rgb24 => (3, rgb_row::<3>),
            PixelFormat::RGBA => (4, rgb_row::<4>),
        };

        let width = frame.width as usize;
        let height = frame.height as usize;
        let stride = frame.stride as usize;

        if width == 0 || height == 0 || stride < width * bpp {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{}x{} {} frame with stride {}",
                frame.width, frame.height, frame.format, frame.stride
            )));
        }

        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + width * bpp;
            let Some(row) = frame.data.get(row_start..row_end) else {
                return Err(DecodeError::UnsupportedFormat(format!(
                    "frame truncated at row {} ({} bytes)",
                    y,
                    frame.data.len()
                )));
            };
            convert(row, &mut data);
        }

        Ok(Self {
            width: frame.width,
            height: frame.height,
            data,
        })
    }

    /// Pixel value at (x, y), 0 outside the image
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Downscale so neither dimension exceeds `max_dimension`
    ///
    /// Returns the image and the factor that maps scaled coordinates back
    /// to the original (1.0 when no scaling was needed).
    pub fn fit_within(self, max_dimension: u32) -> (Self, f32) {
        if self.width <= max_dimension && self.height <= max_dimension {
            return (self, 1.0);
        }
        let scale = (self.width as f32 / max_dimension as f32)
            .max(self.height as f32 / max_dimension as f32);
        let new_width = ((self.width as f32 / scale) as u32).max(1);
        let new_height = ((self.height as f32 / scale) as u32).max(1);
        (self.resize_bilinear(new_width, new_height), scale)
    }

    fn resize_bilinear(&self, dst_width: u32, dst_height: u32) -> Self {
        let x_ratio = self.width as f32 / dst_width as f32;
        let y_ratio = self.height as f32 / dst_height as f32;
        let max_x = self.width - 1;
        let max_y = self.height - 1;

        let mut data = Vec::with_capacity((dst_width * dst_height) as usize);
        for y in 0..dst_height {
            let src_y = y as f32 * y_ratio;
            let y0 = src_y as u32;
            let y1 = (y0 + 1).min(max_y);
            let y_frac = src_y - y0 as f32;

            for x in 0..dst_width {
                let src_x = x as f32 * x_ratio;
                let x0 = src_x as u32;
                let x1 = (x0 + 1).min(max_x);
                let x_frac = src_x - x0 as f32;

                let p00 = self.get(x0, y0) as f32;
                let p01 = self.get(x1, y0) as f32;
                let p10 = self.get(x0, y1) as f32;
                let p11 = self.get(x1, y1) as f32;

                let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                    + p01 * x_frac * (1.0 - y_frac)
                    + p10 * (1.0 - x_frac) * y_frac
                    + p11 * x_frac * y_frac;
                data.push(value as u8);
            }
        }

        Self {
            width: dst_width,
            height: dst_height,
            data,
        }
    }
}

/// Appends the luma of one packed row
type RowConverter = fn(&[u8], &mut Vec<u8>);

fn gray_row(row: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(row);
}

// Y0 U Y1 V: luma sits on even bytes
fn yuyv_row(row: &[u8], out: &mut Vec<u8>) {
    out.extend(row.iter().step_by(2));
}

fn rgb_row<const BPP: usize>(row: &[u8], out: &mut Vec<u8>) {
    out.extend(
        row.chunks_exact(BPP)
            .map(|px| rgb_to_luma(px[0], px[1], px[2])),
    );
}

/// BT.601 luma in fixed point
fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

fn decode_mjpeg(frame: &CameraFrame) -> Result<LumaImage, DecodeError> {
    let img = image::load_from_memory_with_format(&frame.data, image::ImageFormat::Jpeg)
        .map_err(|e| DecodeError::UnsupportedFormat(format!("MJPEG frame: {}", e)))?;
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    Ok(LumaImage {
        width,
        height,
        data: luma.into_raw(),
    })
}
