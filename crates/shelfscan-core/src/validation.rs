//! # Validation Module
//!
//! EAN-8 / EAN-13 (JAN) validation and normalization for Shelf Scan.
//!
//! ## Validation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      validate_jan(raw, policy)                          │
//! │                                                                         │
//! │  raw ──► trim ──► empty? ─────────────────────► EmptyInput             │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               all digits? ── no ──────────────► NonNumeric             │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               len > 13? ── yes ───────────────► TooLong                │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               len 8 or 13? ── no ──┬─ Strict ─► UnsupportedLength      │
//! │                      │             └─ Pad ────► left-pad to 13         │
//! │                      ▼                                                  │
//! │               GS1 check digit ── mismatch ────► ChecksumMismatch       │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               Ok(BarcodeCode)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelfscan_core::validation::{validate, BarcodeValidator, LengthPolicy};
//!
//! let result = validate("049000028911");
//! assert_eq!(result.normalized_code.as_deref(), Some("0049000028911"));
//!
//! let strict = BarcodeValidator::new(LengthPolicy::Strict);
//! assert!(strict.validate("049000028911").is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BarcodeError, BarcodeResult};
use crate::types::{BarcodeCode, ValidationResult};
use crate::{EAN13_LEN, EAN8_LEN};

// =============================================================================
// Length Policy
// =============================================================================

/// How lengths other than 8 and 13 are treated.
///
/// ## Call Sites
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Map view auto-add scanner ──► Strict                                  │
/// │    only native-length codes may add products without confirmation     │
/// │                                                                         │
/// │  Product registration modal ──► PadToEan13                             │
/// │    merchant-internal short codes are padded into EAN-13 space          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Accept only 8 or 13 digits as given.
    Strict,

    /// Left-pad any other length (up to 13) with zeros to 13 digits.
    #[default]
    PadToEan13,
}

impl std::fmt::Display for LengthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthPolicy::Strict => write!(f, "strict"),
            LengthPolicy::PadToEan13 => write!(f, "pad_to_ean13"),
        }
    }
}

impl std::str::FromStr for LengthPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(LengthPolicy::Strict),
            "pad_to_ean13" | "pad" | "padded" => Ok(LengthPolicy::PadToEan13),
            other => Err(format!(
                "Unknown length policy: '{}'. Valid options: strict, pad_to_ean13",
                other
            )),
        }
    }
}

// =============================================================================
// Barcode Validator
// =============================================================================

/// A validator bound to one [`LengthPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarcodeValidator {
    policy: LengthPolicy,
}

impl BarcodeValidator {
    /// Creates a validator with the given policy.
    pub const fn new(policy: LengthPolicy) -> Self {
        BarcodeValidator { policy }
    }

    /// Validator used by the auto-add scanner.
    pub const fn strict() -> Self {
        Self::new(LengthPolicy::Strict)
    }

    /// Validator used by the registration modal and CSV import.
    pub const fn padding() -> Self {
        Self::new(LengthPolicy::PadToEan13)
    }

    /// The policy this validator applies.
    #[inline]
    pub const fn policy(&self) -> LengthPolicy {
        self.policy
    }

    /// Validates and normalizes `raw`.
    pub fn validate(&self, raw: &str) -> BarcodeResult<BarcodeCode> {
        validate_jan(raw, self.policy)
    }

    /// Same as [`validate`](Self::validate), as a serializable report.
    pub fn report(&self, raw: &str) -> ValidationResult {
        self.validate(raw).into()
    }
}

// =============================================================================
// Validators
// =============================================================================

/// Validates `raw` with the padding-tolerant policy and returns a report.
///
/// ## Example
/// ```rust
/// use shelfscan_core::validation::validate;
///
/// assert!(validate("4006381333931").valid);
/// assert!(validate("96385074").valid);
/// assert_eq!(validate("96385075").reason.as_deref(), Some("check digit mismatch"));
/// assert_eq!(validate("12a45").reason.as_deref(), Some("non-numeric"));
/// ```
pub fn validate(raw: &str) -> ValidationResult {
    validate_jan(raw, LengthPolicy::PadToEan13).into()
}

/// Validates `raw` as an EAN-8 / EAN-13 code under `policy`.
///
/// Whitespace around the input is ignored. The returned code is the
/// canonical 8- or 13-digit form.
pub fn validate_jan(raw: &str, policy: LengthPolicy) -> BarcodeResult<BarcodeCode> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(BarcodeError::EmptyInput);
    }

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BarcodeError::NonNumeric);
    }

    let len = raw.len();
    if len > EAN13_LEN {
        return Err(BarcodeError::TooLong { len });
    }

    let normalized = match (len, policy) {
        (EAN8_LEN, _) | (EAN13_LEN, _) => raw.to_string(),
        (_, LengthPolicy::Strict) => return Err(BarcodeError::UnsupportedLength { len }),
        (_, LengthPolicy::PadToEan13) => format!("{:0>width$}", raw, width = EAN13_LEN),
    };

    let digits = to_digits(&normalized);
    let (payload, check) = digits.split_at(digits.len() - 1);
    let expected = if digits.len() == EAN8_LEN {
        ean8_check_digit(payload)
    } else {
        ean13_check_digit(payload)
    };

    if expected != check[0] {
        return Err(BarcodeError::ChecksumMismatch {
            expected,
            found: check[0],
        });
    }

    Ok(BarcodeCode::from_validated(normalized))
}

// =============================================================================
// GS1 Check Digits
// =============================================================================

/// Computes the EAN-13 check digit over a 12-digit payload.
///
/// 1-based even positions weigh 3, odd positions weigh 1.
///
/// ```rust
/// use shelfscan_core::validation::ean13_check_digit;
///
/// assert_eq!(ean13_check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
/// ```
pub fn ean13_check_digit(payload: &[u8]) -> u8 {
    weighted_check_digit(payload, |pos| if pos % 2 == 0 { 3 } else { 1 })
}

/// Computes the EAN-8 check digit over a 7-digit payload.
///
/// 1-based odd positions weigh 3, even positions weigh 1.
pub fn ean8_check_digit(payload: &[u8]) -> u8 {
    weighted_check_digit(payload, |pos| if pos % 2 == 1 { 3 } else { 1 })
}

fn weighted_check_digit(payload: &[u8], weight: impl Fn(usize) -> u32) -> u8 {
    let sum: u32 = payload
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * weight(i + 1))
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn to_digits(s: &str) -> Vec<u8> {
    s.bytes().map(|b| b - b'0').collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
