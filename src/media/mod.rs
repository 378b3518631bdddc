// SPDX-License-Identifier: GPL-3.0-only

//! Media conversion utilities
//!
//! - [`latin1`]: single-byte text codec used for decode service payloads
//! - [`luma`]: camera frame to greyscale conversion and downscaling for detection

pub mod latin1;
pub mod luma;

pub use luma::LumaImage;
