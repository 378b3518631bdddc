// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    ScannerPage      │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← Access checks, enumeration, shared handle
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────┐
//!       ▼           ▼
//!   ┌──────┐  ┌───────────┐
//!   │ V4L2 │  │Image files│
//!   └──────┘  └───────────┘
//! ```

pub mod frame_loop;
pub mod image_files;
pub mod manager;
pub mod types;
pub mod v4l2;

pub use frame_loop::{DecodeSubscription, LoopAction};
pub use manager::CameraBackendManager;
pub use types::*;

use std::path::Path;

/// Camera backend trait
///
/// Backends are shared between the UI task and decode loop threads, so
/// every operation takes `&self`.
pub trait CameraBackend: Send + Sync {
    /// Check that cameras can be used at all
    ///
    /// # Returns
    /// * `Ok(())` - Devices may be opened
    /// * `Err(BackendError::NotAvailable)` - No camera subsystem on this host
    /// * `Err(BackendError::PermissionDenied)` - Devices exist but access is refused
    fn check_access(&self) -> BackendResult<()>;

    /// Enumerate available video-input devices, in a stable order
    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>>;

    /// Open a live frame stream for a device
    ///
    /// Called on the decode loop thread; the stream is dropped there.
    fn open_stream(&self, device: &CameraDevice) -> BackendResult<Box<dyn FrameStream>>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// Create a backend instance for the given type
///
/// `image_source` is the directory (or single file) replayed by the image
/// backend; it is ignored by V4L2.
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    image_source: Option<&Path>,
) -> Box<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Backend::new()),
        CameraBackendType::ImageFiles => Box::new(image_files::ImageFileBackend::new(
            image_source.unwrap_or_else(|| Path::new(".")),
        )),
    }
}
