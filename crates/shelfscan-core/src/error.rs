//! # Error Types
//!
//! Domain-specific error types for shelfscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelfscan-core errors (this file)                                     │
//! │  ├── BarcodeError      - Why a JAN failed validation                   │
//! │  ├── ScanError         - Why a scan session was discarded              │
//! │  ├── ImportError       - Handy-terminal CSV could not be read          │
//! │  └── RegistrationError - Registration reply could not be understood    │
//! │                                                                         │
//! │  shelfscan-input errors (separate crate)                               │
//! │  └── ScannerError      - Config and agent channel failures             │
//! │                                                                         │
//! │  Flow: BarcodeError → ScanError → (logged, never surfaced)             │
//! │        BarcodeError → InvalidLine → ImportReport → operator message    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Errors are enum variants, never String
//! 3. Scan-path errors are recovered locally; only the CSV import and
//!    registration summary turn them into operator-facing text

use thiserror::Error;

// =============================================================================
// Barcode Error
// =============================================================================

/// Reasons a raw JAN string is not an acceptable EAN-8 / EAN-13 code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    /// Nothing left after trimming whitespace.
    #[error("JAN code is empty")]
    EmptyInput,

    /// Contains a character outside `0`-`9`.
    #[error("JAN code must contain digits only")]
    NonNumeric,

    /// More than 13 digits.
    #[error("JAN code must be at most 13 digits (got {len})")]
    TooLong { len: usize },

    /// Length the strict validator does not accept (anything but 8 or 13).
    #[error("JAN code must be 8 or 13 digits (got {len})")]
    UnsupportedLength { len: usize },

    /// The trailing check digit does not match the payload.
    ///
    /// ## When This Occurs
    /// - Scanner misread a bar
    /// - Operator mistyped a digit in the manual field
    /// - A short merchant code was padded but never carried a check digit
    #[error("check digit mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: u8, found: u8 },
}

impl BarcodeError {
    /// Short machine-friendly reason, stable across message rewording.
    pub fn reason(&self) -> &'static str {
        match self {
            BarcodeError::EmptyInput => "empty",
            BarcodeError::NonNumeric => "non-numeric",
            BarcodeError::TooLong { .. } => "too long",
            BarcodeError::UnsupportedLength { .. } => "unsupported length",
            BarcodeError::ChecksumMismatch { .. } => "check digit mismatch",
        }
    }
}

// =============================================================================
// Scan Error
// =============================================================================

/// Why an input aggregation session ended without a commit.
///
/// None of these reach the operator; they are logged and reported in the
/// aggregator's outcome so callers and tests can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The accumulated text was not a valid code.
    #[error("scan rejected: {0}")]
    Invalid(#[from] BarcodeError),

    /// Went idle after the maximum scan duration; treated as human typing.
    #[error("scan timed out after {elapsed_ms} ms (limit {limit_ms} ms)")]
    TimedOut { elapsed_ms: u64, limit_ms: u64 },
}

impl ScanError {
    /// Short machine-friendly reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ScanError::Invalid(e) => e.reason(),
            ScanError::TimedOut { .. } => "timed out",
        }
    }
}

// =============================================================================
// Import Error
// =============================================================================

/// Failure to read a handy-terminal CSV export.
///
/// Individual bad lines are not errors; they are collected in the
/// [`ImportReport`](crate::import::ImportReport).
#[derive(Debug, Error)]
pub enum ImportError {
    /// File could not be opened or decoded as UTF-8.
    #[error("failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Registration Error
// =============================================================================

/// The registration endpoint replied with something we cannot summarize.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Reply is not JSON or has the wrong shape.
    #[error("registration response is malformed: {0}")]
    MalformedResponse(String),
}

impl From<serde_json::Error> for RegistrationError {
    fn from(err: serde_json::Error) -> Self {
        RegistrationError::MalformedResponse(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for barcode validation results.
pub type BarcodeResult<T> = Result<T, BarcodeError>;

// =============================================================================
// Unit Tests
// =============================================================================
