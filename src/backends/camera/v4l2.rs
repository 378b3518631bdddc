// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 camera backend
//!
//! Enumerates `/dev/video*` capture nodes and streams frames from them
//! through memory-mapped buffers.

use super::CameraBackend;
use super::types::*;
use crate::constants::v4l2 as v4l2_consts;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// V4L2 backend
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

/// List `/dev/videoN` nodes sorted by N
fn video_nodes() -> Vec<PathBuf> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(v4l2_consts::DEV_DIR)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, entry.path()))
        })
        .collect();
    nodes.sort_by_key(|(index, _)| *index);
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Build a device entry if the node is a usable capture device
fn query_node(path: &Path) -> Option<CameraDevice> {
    let path_str = path.to_string_lossy().to_string();
    let dev = match Device::with_path(path) {
        Ok(dev) => dev,
        Err(e) => {
            debug!(path = %path_str, error = %e, "Skipping V4L2 node that cannot be opened");
            return None;
        }
    };

    let caps = dev.query_caps().ok()?;
    if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        debug!(path = %path_str, "Skipping node without video capture capability");
        return None;
    }

    // UVC metadata nodes advertise capture but list no formats
    let has_formats = dev.enum_formats().map(|f| !f.is_empty()).unwrap_or(false);
    if !has_formats {
        debug!(path = %path_str, "Skipping node without capture formats");
        return None;
    }

    let real_path = std::fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path_str.clone());

    let label = if caps.card.is_empty() {
        path_str.clone()
    } else {
        caps.card.clone()
    };

    Some(CameraDevice {
        id: path_str,
        label,
        device_info: Some(DeviceInfo {
            driver: caps.driver,
            bus: caps.bus,
            real_path,
        }),
    })
}

impl CameraBackend for V4l2Backend {
    fn check_access(&self) -> BackendResult<()> {
        if !Path::new(v4l2_consts::SYSFS_CLASS).exists() {
            return Err(BackendError::NotAvailable(
                "video4linux subsystem not present".to_string(),
            ));
        }

        let nodes = video_nodes();
        if nodes.is_empty() {
            // Nothing to be denied; enumeration reports the empty set
            return Ok(());
        }

        let mut denied = 0;
        for node in &nodes {
            match std::fs::OpenOptions::new().read(true).write(true).open(node) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => denied += 1,
                Err(e) => debug!(path = %node.display(), error = %e, "Node not openable"),
            }
        }

        if denied == nodes.len() {
            warn!(nodes = nodes.len(), "All video nodes refused access");
            Err(BackendError::PermissionDenied(format!(
                "no access to {} video device(s); is the user in the 'video' group?",
                denied
            )))
        } else {
            Ok(())
        }
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras: Vec<CameraDevice> = video_nodes().iter().filter_map(|p| query_node(p)).collect();
        for camera in &cameras {
            debug!(id = %camera.id, label = %camera.label, "Found V4L2 camera");
        }
        Ok(cameras)
    }

    fn open_stream(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameStream>> {
        Ok(Box::new(V4l2FrameStream::open(&device.id)?))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// Memory-mapped capture stream for one device
struct V4l2FrameStream {
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
    _device: Device,
}

impl V4l2FrameStream {
    fn open(path: &str) -> BackendResult<Self> {
        let dev = Device::with_path(path)?;

        let available: Vec<FourCC> = dev
            .enum_formats()
            .map_err(|e| BackendError::IoError(format!("Failed to list formats: {}", e)))?
            .into_iter()
            .map(|desc| desc.fourcc)
            .collect();

        let chosen = v4l2_consts::PREFERRED_FOURCCS
            .iter()
            .map(|repr| FourCC::new(repr))
            .find(|fourcc| available.contains(fourcc))
            .ok_or_else(|| {
                BackendError::FormatNotSupported(format!(
                    "{} offers none of the supported pixel formats ({:?})",
                    path, available
                ))
            })?;

        let mut format = dev
            .format()
            .map_err(|e| BackendError::IoError(format!("Failed to query format: {}", e)))?;
        format.fourcc = chosen;
        format.width = v4l2_consts::CAPTURE_WIDTH;
        format.height = v4l2_consts::CAPTURE_HEIGHT;

        let format = dev
            .set_format(&format)
            .map_err(|e| BackendError::FormatNotSupported(format!("Failed to set format: {}", e)))?;

        let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            BackendError::FormatNotSupported(format!("Driver selected {:?}", format.fourcc))
        })?;

        info!(
            path,
            width = format.width,
            height = format.height,
            fourcc = %pixel_format,
            "Opened V4L2 capture stream"
        );

        let stream = MmapStream::with_buffers(&dev, Type::VideoCapture, v4l2_consts::BUFFER_COUNT)
            .map_err(|e| BackendError::IoError(format!("Failed to create buffer stream: {}", e)))?;

        Ok(Self {
            stream,
            width: format.width,
            height: format.height,
            stride: format.stride,
            format: pixel_format,
            _device: dev,
        })
    }
}

impl FrameStream for V4l2FrameStream {
    fn next_frame(&mut self) -> BackendResult<CameraFrame> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| BackendError::IoError(format!("Failed to dequeue frame: {}", e)))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let used = if used == 0 { buf.len() } else { used };

        let stride = match self.format.bytes_per_pixel() {
            Some(bpp) if self.stride == 0 => self.width * bpp as u32,
            _ => self.stride,
        };

        Ok(CameraFrame {
            width: self.width,
            height: self.height,
            data: std::sync::Arc::from(&buf[..used]),
            format: self.format,
            stride,
            captured_at: Instant::now(),
        })
    }
}
