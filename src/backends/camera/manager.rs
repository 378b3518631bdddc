// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend manager
//!
//! The manager provides:
//! - Access checks and device enumeration with logging
//! - A cloneable, thread-safe handle to the active backend

use super::types::*;
use super::{CameraBackend, get_backend_for_type};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Camera backend manager
///
/// Cheap to clone; clones share the same backend instance.
#[derive(Clone)]
pub struct CameraBackendManager {
    backend: Arc<dyn CameraBackend>,
}

impl CameraBackendManager {
    /// Create a manager for a backend type
    pub fn new(backend_type: CameraBackendType, image_source: Option<&Path>) -> Self {
        info!(backend = %backend_type, "Creating camera backend manager");
        Self::with_backend(get_backend_for_type(backend_type, image_source))
    }

    /// Wrap an existing backend instance
    pub fn with_backend(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            backend: Arc::from(backend),
        }
    }

    /// Get the backend type
    pub fn backend_type(&self) -> CameraBackendType {
        self.backend.backend_type()
    }

    /// Shared handle for decode loop threads
    pub fn backend(&self) -> Arc<dyn CameraBackend> {
        Arc::clone(&self.backend)
    }

    /// Check camera access
    pub fn check_access(&self) -> BackendResult<()> {
        let result = self.backend.check_access();
        debug!(backend = %self.backend_type(), ok = result.is_ok(), "Checked camera access");
        result
    }

    /// Enumerate available cameras
    ///
    /// An empty listing is reported as [`BackendError::DeviceNotFound`].
    pub fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.backend.enumerate_cameras()?;
        if cameras.is_empty() {
            return Err(BackendError::DeviceNotFound("No cameras found".to_string()));
        }
        info!(count = cameras.len(), "Enumerated cameras");
        Ok(cameras)
    }
}

impl std::fmt::Debug for CameraBackendManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraBackendManager")
            .field("backend_type", &self.backend_type())
            .finish()
    }
}
