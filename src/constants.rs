// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Decode service defaults
pub mod service {
    /// Endpoint used when neither config nor environment names one
    pub const DEFAULT_ENDPOINT: &str =
        "https://gateway.apiserpro.serpro.gov.br/viodec-trial/v1/decode";

    /// Environment variable that overrides the configured endpoint
    pub const ENDPOINT_ENV: &str = "QRSCAN_ENDPOINT";

    /// Environment variable holding the bearer token by default
    pub const TOKEN_ENV: &str = "QRSCAN_TOKEN";

    /// Default request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Media type of the request body
    pub const PAYLOAD_CONTENT_TYPE: &str = "application/octet-stream";

    /// Media type requested for the response
    pub const ACCEPT: &str = "application/json";
}

/// QR detection tuning
pub mod detection {
    /// Frames larger than this (in either dimension) are downscaled before detection
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;

    /// Smallest accepted max dimension; QR modules vanish below this
    pub const MIN_MAX_DIMENSION: u32 = 160;
}

/// V4L2 capture settings
pub mod v4l2 {
    /// Directory holding device nodes
    pub const DEV_DIR: &str = "/dev";

    /// Present when the video4linux subsystem is loaded
    pub const SYSFS_CLASS: &str = "/sys/class/video4linux";

    /// Pixel formats in order of preference; luma is cheapest to extract from YUYV
    pub const PREFERRED_FOURCCS: [[u8; 4]; 4] = [*b"YUYV", *b"GREY", *b"RGB3", *b"MJPG"];

    /// Requested capture size; drivers round to the nearest supported mode
    pub const CAPTURE_WIDTH: u32 = 640;
    pub const CAPTURE_HEIGHT: u32 = 480;

    /// Number of mmap buffers
    pub const BUFFER_COUNT: u32 = 4;
}

/// Supported file formats for the image backend
pub mod file_formats {
    use std::time::Duration;

    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Pace at which a still image is re-delivered (~30fps)
    pub const STILL_FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Configuration file location
pub mod config_file {
    /// Directory under the user config dir
    pub const APP_DIR: &str = "qrscan";

    /// File name inside [`APP_DIR`]
    pub const FILE_NAME: &str = "config.json";
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
