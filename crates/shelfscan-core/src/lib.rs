//! # shelfscan-core: Pure Barcode Logic for Shelf Scan
//!
//! This crate holds the barcode rules of Shelf Scan as pure functions with no
//! runtime I/O: EAN-8 / EAN-13 validation, JAN normalization and the
//! bookkeeping around the product registration modal.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf Scan Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Scanner (HID keyboard emulation)                │   │
//! │  │        fragments ─► terminators ─► Enter/Tab ─► paste           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          shelfscan-input (InputAggregator, ScanAgent)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ accumulated text                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shelfscan-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌──────────────┐  ┌────────┐  │   │
//! │  │   │validation │  │registration│  │    import    │  │ export │  │   │
//! │  │   │ EAN-8/13  │  │AdditionList│  │ handy CSV    │  │  CSV   │  │   │
//! │  │   └───────────┘  └────────────┘  └──────────────┘  └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO TIMERS • NO NETWORK • PURE FUNCTIONS                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (BarcodeCode, ValidationResult, PendingProduct)
//! - [`validation`] - EAN check digits and the length policies
//! - [`error`] - Domain error types
//! - [`registration`] - Addition list and registration result summary
//! - [`import`] - Handy-terminal CSV import
//! - [`export`] - Selection CSV export
//!
//! ## Example Usage
//!
//! ```rust
//! use shelfscan_core::validation::{validate_jan, LengthPolicy};
//! use shelfscan_core::Symbology;
//!
//! let code = validate_jan("049000028911", LengthPolicy::PadToEan13).unwrap();
//! assert_eq!(code.as_str(), "0049000028911");
//! assert_eq!(code.symbology(), Symbology::Ean13);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod import;
pub mod registration;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{BarcodeError, BarcodeResult, ImportError, RegistrationError, ScanError};
pub use registration::{AddOutcome, AdditionList, RegistrationSummary};
pub use types::*;
pub use validation::{validate, validate_jan, BarcodeValidator, LengthPolicy};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Digits in an EAN-8 code, check digit included.
pub const EAN8_LEN: usize = 8;

/// Digits in an EAN-13 code, check digit included.
///
/// Also the longest code either validator accepts, and the width short codes
/// are padded to.
pub const EAN13_LEN: usize = 13;
