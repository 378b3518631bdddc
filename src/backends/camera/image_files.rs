// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera backend
//!
//! Exposes each image file in a directory (or a single image file) as a
//! camera that keeps delivering the same frame at a fixed rate. Useful for
//! scanning screenshots and for exercising the scanner without hardware.

use super::CameraBackend;
use super::types::*;
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Image file backend
#[derive(Debug, Clone)]
pub struct ImageFileBackend {
    source: PathBuf,
}

impl ImageFileBackend {
    /// `source` may be a directory of images or a single image file
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| file_formats::is_image_extension(&e.to_lowercase()))
        .unwrap_or(false)
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl CameraBackend for ImageFileBackend {
    fn check_access(&self) -> BackendResult<()> {
        if !self.source.exists() {
            return Err(BackendError::NotAvailable(format!(
                "{} does not exist",
                self.source.display()
            )));
        }
        if self.source.is_dir() {
            std::fs::read_dir(&self.source)?;
        } else {
            std::fs::File::open(&self.source)?;
        }
        Ok(())
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let mut paths: Vec<PathBuf> = if self.source.is_dir() {
            std::fs::read_dir(&self.source)?
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_image(path))
                .collect()
        } else if is_image(&self.source) {
            vec![self.source.clone()]
        } else {
            Vec::new()
        };
        paths.sort();

        debug!(source = %self.source.display(), count = paths.len(), "Enumerated image cameras");

        Ok(paths
            .iter()
            .map(|path| CameraDevice::new(path.to_string_lossy(), label_for(path)))
            .collect())
    }

    fn open_stream(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameStream>> {
        let frame = load_image_frame(Path::new(&device.id))?;
        info!(
            path = %device.id,
            width = frame.width,
            height = frame.height,
            "Replaying still image as camera"
        );
        Ok(Box::new(StillImageStream {
            frame,
            interval: file_formats::STILL_FRAME_INTERVAL,
            last: None,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::ImageFiles
    }
}

/// Load an image file as a greyscale frame
pub fn load_image_frame(path: &Path) -> BackendResult<CameraFrame> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from(io),
        other => BackendError::FormatNotSupported(format!("{}: {}", path.display(), other)),
    })?;
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    Ok(CameraFrame::gray(width, height, luma.into_raw()))
}

/// Repeats one frame, paced like a camera
struct StillImageStream {
    frame: CameraFrame,
    interval: Duration,
    last: Option<Instant>,
}

impl FrameStream for StillImageStream {
    fn next_frame(&mut self) -> BackendResult<CameraFrame> {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());

        let mut frame = self.frame.clone();
        frame.captured_at = Instant::now();
        Ok(frame)
    }
}
