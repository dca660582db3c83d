//! # Scanner Error Types
//!
//! Error types for the scan engine's outer layer: configuration and the
//! agent command channel.
//!
//! Scan discards (bad check digit, timed-out typing) are NOT errors here.
//! They are [`ScanError`](shelfscan_core::ScanError) values reported in a
//! [`ScanOutcome`](crate::aggregator::ScanOutcome) and never propagate.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────────┐          ┌─────────────────────────────────┐  │
//! │  │  Configuration      │          │  Agent                          │  │
//! │  │                     │          │                                 │  │
//! │  │  InvalidConfig      │          │  ChannelError                   │  │
//! │  │  ConfigLoadFailed   │          │                                 │  │
//! │  │  ConfigSaveFailed   │          │                                 │  │
//! │  └─────────────────────┘          └─────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for scanner operations.
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Scanner error type covering configuration and agent failures.
#[derive(Debug, Error)]
pub enum ScannerError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scanner configuration.
    #[error("Invalid scanner configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Agent Errors
    // =========================================================================
    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ScannerError {
    fn from(err: std::io::Error) -> Self {
        ScannerError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ScannerError {
    fn from(err: toml::de::Error) -> Self {
        ScannerError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ScannerError {
    fn from(err: toml::ser::Error) -> Self {
        ScannerError::ConfigSaveFailed(err.to_string())
    }
}

impl ScannerError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScannerError::InvalidConfig(_)
                | ScannerError::ConfigLoadFailed(_)
                | ScannerError::ConfigSaveFailed(_)
        )
    }
}
