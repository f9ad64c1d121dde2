//! # Error Types
//!
//! Custom error types for Camera PTZ using `thiserror`.

use thiserror::Error;

/// Main error type for Camera PTZ
#[derive(Debug, Error)]
pub enum PtzError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input backend errors (device scan, state queries)
    #[error("Joystick error: {0}")]
    Joystick(String),

    /// More than one connected joystick matches the selection rule
    #[error("{} joysticks match {}: {}", .candidates.len(), describe_pattern(.pattern), .candidates.join(", "))]
    AmbiguousJoystick {
        pattern: Option<String>,
        candidates: Vec<String>,
    },

    /// The selected joystick cannot drive pan, tilt and zoom
    #[error("joystick '{name}' has {found} axes, at least {required} are needed")]
    InsufficientAxes {
        name: String,
        found: usize,
        required: usize,
    },

    /// A camera control write failed
    #[error("failed to set camera control '{control}': {reason}")]
    ControlFailed { control: String, reason: String },
}

fn describe_pattern(pattern: &Option<String>) -> String {
    match pattern {
        Some(p) => format!("pattern '{}'", p),
        None => "no name pattern (use --joystick to pick one)".to_string(),
    }
}

/// Result type alias for Camera PTZ
pub type Result<T> = std::result::Result<T, PtzError>;
