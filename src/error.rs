//! # Error Types
//!
//! Custom error types for the RC transmitter using `thiserror`.

use thiserror::Error;

/// Main error type for the RC transmitter
#[derive(Debug, Error)]
pub enum TransmitterError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Stick or keypad input errors
    #[error("Input error: {0}")]
    Input(String),

    /// No input device exposing the configured axes was found
    #[error("No input device found: {0}")]
    InputDeviceNotFound(String),

    /// Radio link errors
    #[error("Link error: {0}")]
    Link(String),

    /// Telemetry log errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the RC transmitter
pub type Result<T> = std::result::Result<T, TransmitterError>;
