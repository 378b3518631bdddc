// SPDX-License-Identifier: GPL-3.0-only

//! Default device selection policies

use crate::backends::camera::types::CameraDevice;
use tracing::debug;

/// Picks the device selected right after enumeration
pub trait SelectionPolicy: Send + Sync {
    /// Return the id of the device to select, or `None` to leave it empty
    fn select(&self, devices: &[CameraDevice]) -> Option<String>;
}

/// Select the first enumerated device
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDevice;

impl SelectionPolicy for FirstDevice {
    fn select(&self, devices: &[CameraDevice]) -> Option<String> {
        devices.first().map(|d| d.id.clone())
    }
}

/// Prefer a device by id or label, falling back to the first one
///
/// The hint matches an exact id first, then a case-insensitive label
/// fragment.
#[derive(Debug, Clone)]
pub struct PreferredDevice {
    hint: String,
}

impl PreferredDevice {
    pub fn new(hint: impl Into<String>) -> Self {
        Self { hint: hint.into() }
    }
}

impl SelectionPolicy for PreferredDevice {
    fn select(&self, devices: &[CameraDevice]) -> Option<String> {
        if let Some(device) = devices.iter().find(|d| d.id == self.hint) {
            return Some(device.id.clone());
        }

        let needle = self.hint.to_lowercase();
        if let Some(device) = devices
            .iter()
            .find(|d| d.label.to_lowercase().contains(&needle))
        {
            return Some(device.id.clone());
        }

        debug!(hint = %self.hint, "Preferred device not present, using first device");
        FirstDevice.select(devices)
    }
}

/// Policy for an optional preference hint
pub fn policy_for(hint: Option<&str>) -> Box<dyn SelectionPolicy> {
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) => Box::new(PreferredDevice::new(hint)),
        None => Box::new(FirstDevice),
    }
}
