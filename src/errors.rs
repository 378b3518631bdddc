// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera access, enumeration or streaming errors
    Camera(BackendError),
    /// Payload could not be converted for transmission
    Encoding(EncodingError),
    /// Decode service errors
    Submission(SubmissionError),
    /// Configuration errors
    Config(ConfigError),
    /// Generic error with message
    Other(String),
}

/// Per-frame decode failures
///
/// These never interrupt a scan; the decode loop logs them and moves on
/// to the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No QR code was found in the frame
    NoCode,
    /// A code was located but its payload could not be read
    Unreadable(String),
    /// The frame's pixel layout cannot be converted to luma
    UnsupportedFormat(String),
}

/// A character outside the single-byte range was found in a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// The offending character
    pub character: char,
    /// Character index within the text
    pub index: usize,
}

/// Decode service submission errors
#[derive(Debug, Clone)]
pub enum SubmissionError {
    /// The HTTP client could not be built
    Client(String),
    /// The request never produced a response (DNS, connect, TLS, timeout)
    Transport(String),
    /// The service answered with a non-success status
    Http {
        status: u16,
        /// Response body, parsed as JSON when possible
        body: serde_json::Value,
    },
    /// The service answered 2xx but the body was not JSON
    InvalidResponse(String),
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Config file exists but could not be read
    Read(String),
    /// Config file is not valid JSON for [`crate::Config`]
    Parse(String),
    /// Bearer token could not be resolved from its source
    MissingToken(String),
    /// Endpoint is empty or not an http(s) URL
    InvalidEndpoint(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Encoding(e) => write!(f, "Encoding error: {}", e),
            AppError::Submission(e) => write!(f, "Submission error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NoCode => write!(f, "No QR code in frame"),
            DecodeError::Unreadable(msg) => write!(f, "QR code unreadable: {}", msg),
            DecodeError::UnsupportedFormat(msg) => write!(f, "Unsupported frame format: {}", msg),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "character {:?} (U+{:04X}) at index {} is outside the Latin-1 range",
            self.character, self.character as u32, self.index
        )
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Client(msg) => write!(f, "Failed to build HTTP client: {}", msg),
            SubmissionError::Transport(msg) => write!(f, "Request failed: {}", msg),
            SubmissionError::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            SubmissionError::InvalidResponse(msg) => write!(f, "Invalid JSON response: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::MissingToken(msg) => write!(f, "Bearer token unavailable: {}", msg),
            ConfigError::InvalidEndpoint(msg) => write!(f, "Invalid endpoint: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for EncodingError {}
impl std::error::Error for SubmissionError {}
impl std::error::Error for ConfigError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<EncodingError> for AppError {
    fn from(err: EncodingError) -> Self {
        AppError::Encoding(err)
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::Submission(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<reqwest::Error> for SubmissionError {
    fn from(err: reqwest::Error) -> Self {
        SubmissionError::Transport(err.to_string())
    }
}
