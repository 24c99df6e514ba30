//! Unified error handling for refan
//!
//! This crate provides a single error type used across all refan components.
//! It uses thiserror for ergonomic error definitions with proper Display and
//! Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using RefanError
pub type Result<T> = std::result::Result<T, RefanError>;

/// Unified error type for all refan operations
#[derive(thiserror::Error, Debug)]
pub enum RefanError {
    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("Failed to read temperature from {path}: {reason}")]
    TemperatureRead { path: PathBuf, reason: String },

    #[error("Failed to read PWM from {path}: {reason}")]
    PwmRead { path: PathBuf, reason: String },

    #[error("Failed to write PWM to {path}: {reason}")]
    PwmWrite { path: PathBuf, reason: String },

    #[error("Failed to write PWM mode to {path}: {reason}")]
    ModeWrite { path: PathBuf, reason: String },

    #[error("Fan '{fan}': unparseable temperature reading '{text}'")]
    SensorParse { fan: String, text: String },

    #[error("Fan '{fan}': unparseable duty-cycle readback '{text}'")]
    ReadbackParse { fan: String, text: String },

    /// Duty-cycle readback after a write did not match the commanded value.
    /// The control channel can no longer be trusted; this is fatal for the
    /// whole daemon.
    #[error("Fan '{fan}': wrote PWM {wrote} but read back {read}")]
    VerifyMismatch { fan: String, wrote: u8, read: u8 },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

impl RefanError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid configuration value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error originates in configuration handling, as opposed
    /// to the hardware control path. Drives the process exit-status split.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::TomlParse(_)
                | Self::InvalidConfig { .. }
                | Self::MissingConfig(_)
        )
    }
}
