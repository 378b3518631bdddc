// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for frame capture
//!
//! - [`camera`]: Camera backends with device enumeration and frame streams

pub mod camera;
