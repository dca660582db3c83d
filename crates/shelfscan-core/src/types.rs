//! # Domain Types
//!
//! Core domain types used throughout Shelf Scan.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │  BarcodeCode    │   │ ValidationResult │   │ PendingProduct  │      │
//! │  │  ─────────────  │   │ ──────────────── │   │ ─────────────── │      │
//! │  │  8 or 13 digits │   │ valid            │   │ shelf_id        │      │
//! │  │  check verified │   │ normalizedCode   │   │ jan (code)      │      │
//! │  └─────────────────┘   │ reason           │   │ source          │      │
//! │                        └──────────────────┘   └─────────────────┘      │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │   Symbology     │   │  ProductSource   │   │ SelectedProduct │      │
//! │  │  Ean8 / Ean13   │   │  HandyCsv        │   │ (CSV export)    │      │
//! │  └─────────────────┘   │  ManualInput     │   └─────────────────┘      │
//! │                        │  Scanner         │                            │
//! │                        └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validated Newtype Pattern
//! A [`BarcodeCode`] can only be produced by the validator (or by
//! deserializing a string that passes strict validation), so any code held
//! in the system has passed checksum verification.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{BarcodeError, BarcodeResult};
use crate::validation::{validate_jan, LengthPolicy};

// =============================================================================
// Symbology
// =============================================================================

/// The EAN family member a code belongs to, determined by its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// 7 payload digits + 1 check digit.
    Ean8,
    /// 12 payload digits + 1 check digit.
    Ean13,
}

impl Symbology {
    /// Number of digits including the check digit.
    #[inline]
    pub const fn len(&self) -> usize {
        match self {
            Symbology::Ean8 => crate::EAN8_LEN,
            Symbology::Ean13 => crate::EAN13_LEN,
        }
    }

    /// Maps a digit count to a symbology, if it is one.
    pub const fn from_len(len: usize) -> Option<Self> {
        match len {
            crate::EAN8_LEN => Some(Symbology::Ean8),
            crate::EAN13_LEN => Some(Symbology::Ean13),
            _ => None,
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::Ean8 => write!(f, "EAN-8"),
            Symbology::Ean13 => write!(f, "EAN-13"),
        }
    }
}

// =============================================================================
// Barcode Code
// =============================================================================

/// A checksum-verified EAN-8 or EAN-13 code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BarcodeCode(String);

impl BarcodeCode {
    /// Wraps a string the validator has already checked.
    pub(crate) fn from_validated(digits: String) -> Self {
        debug_assert!(Symbology::from_len(digits.len()).is_some());
        BarcodeCode(digits)
    }

    /// The digits as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the digit string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// EAN-8 or EAN-13, by length.
    pub fn symbology(&self) -> Symbology {
        if self.0.len() == crate::EAN8_LEN {
            Symbology::Ean8
        } else {
            Symbology::Ean13
        }
    }

    /// The trailing check digit.
    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[self.0.len() - 1] - b'0'
    }
}

impl fmt::Display for BarcodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BarcodeCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<BarcodeCode> for String {
    fn from(code: BarcodeCode) -> Self {
        code.0
    }
}

/// Parsing goes through the strict validator: a normalized code is always
/// 8 or 13 digits with a valid check digit.
impl TryFrom<String> for BarcodeCode {
    type Error = BarcodeError;

    fn try_from(value: String) -> BarcodeResult<Self> {
        validate_jan(&value, LengthPolicy::Strict)
    }
}

impl std::str::FromStr for BarcodeCode {
    type Err = BarcodeError;

    fn from_str(s: &str) -> BarcodeResult<Self> {
        validate_jan(s, LengthPolicy::Strict)
    }
}

// =============================================================================
// Validation Result
// =============================================================================

/// Serializable outcome of a single validation call.
///
/// ## Shape
/// ```text
/// valid    │ normalizedCode   │ reason
/// ─────────┼──────────────────┼───────────────────────
/// true     │ "4006381333931"  │ null
/// false    │ null             │ "check digit mismatch"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the input is an acceptable code.
    pub valid: bool,

    /// Canonical 8- or 13-digit form, when valid.
    pub normalized_code: Option<String>,

    /// Short reason, when invalid.
    pub reason: Option<String>,
}

impl ValidationResult {
    /// Returns true if the validated input was accepted.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl From<BarcodeResult<BarcodeCode>> for ValidationResult {
    fn from(result: BarcodeResult<BarcodeCode>) -> Self {
        match result {
            Ok(code) => ValidationResult {
                valid: true,
                normalized_code: Some(code.into_string()),
                reason: None,
            },
            Err(err) => ValidationResult {
                valid: false,
                normalized_code: None,
                reason: Some(err.reason().to_string()),
            },
        }
    }
}

// =============================================================================
// Product Source
// =============================================================================

/// Where a pending product entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductSource {
    /// Imported from a handy-terminal CSV export.
    HandyCsv,
    /// Typed (or scanned) into the manual JAN field and added.
    ManualInput,
    /// Committed directly by a scan agent.
    Scanner,
}

// =============================================================================
// Pending Product
// =============================================================================

/// A product waiting to be registered on a shelf.
///
/// ## Design Notes
/// - `product_name` starts out as the JAN itself; the registration endpoint
///   resolves the real name
/// - `jan` is unique within an [`AdditionList`](crate::registration::AdditionList)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PendingProduct {
    /// Shelf the product will be registered on.
    pub shelf_id: String,

    /// Normalized JAN code.
    #[ts(type = "string")]
    pub jan: BarcodeCode,

    /// Display name.
    pub product_name: String,

    /// How the entry was added.
    pub source: ProductSource,

    /// When the entry was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl PendingProduct {
    /// Creates an entry named after its own JAN.
    pub fn new(shelf_id: impl Into<String>, jan: BarcodeCode, source: ProductSource) -> Self {
        PendingProduct {
            shelf_id: shelf_id.into(),
            product_name: jan.to_string(),
            jan,
            source,
            added_at: Utc::now(),
        }
    }
}

// =============================================================================
// Selected Product
// =============================================================================

/// A product the operator ticked in the shelf view, for CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProduct {
    pub shelf_id: String,
    pub jan: String,
    pub product_name: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_from_len() {
        assert_eq!(Symbology::from_len(8), Some(Symbology::Ean8));
        assert_eq!(Symbology::from_len(13), Some(Symbology::Ean13));
        assert_eq!(Symbology::from_len(12), None);
        assert_eq!(Symbology::Ean13.len(), 13);
        assert_eq!(Symbology::Ean8.to_string(), "EAN-8");
    }

    #[test]
    fn test_barcode_code_parse() {
        let code: BarcodeCode = "4006381333931".parse().unwrap();
        assert_eq!(code.as_str(), "4006381333931");
        assert_eq!(code.symbology(), Symbology::Ean13);
        assert_eq!(code.check_digit(), 1);

        let code: BarcodeCode = "96385074".parse().unwrap();
        assert_eq!(code.symbology(), Symbology::Ean8);

        // Strict parsing never pads.
        assert!("049000028911".parse::<BarcodeCode>().is_err());
    }

    #[test]
    fn test_barcode_code_serde() {
        let code: BarcodeCode = "4006381333931".parse().unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"4006381333931\"");

        let back: BarcodeCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);

        // Deserialization refuses codes that fail the checksum.
        assert!(serde_json::from_str::<BarcodeCode>("\"4006381333932\"").is_err());
    }

    #[test]
    fn test_validation_result_shape() {
        let ok: ValidationResult = validate_jan("96385074", LengthPolicy::PadToEan13).into();
        assert!(ok.is_valid());
        assert_eq!(ok.normalized_code.as_deref(), Some("96385074"));
        assert_eq!(ok.reason, None);

        let bad: ValidationResult = validate_jan("96385075", LengthPolicy::PadToEan13).into();
        assert!(!bad.is_valid());
        assert_eq!(bad.reason.as_deref(), Some("check digit mismatch"));

        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["normalizedCode"], "96385074");
    }

    #[test]
    fn test_pending_product_defaults_name_to_jan() {
        let code: BarcodeCode = "4006381333931".parse().unwrap();
        let pending = PendingProduct::new("S01_1F_12", code, ProductSource::ManualInput);
        assert_eq!(pending.product_name, "4006381333931");
        assert_eq!(pending.shelf_id, "S01_1F_12");

        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["source"], "manual_input");
        assert_eq!(json["jan"], "4006381333931");
    }
}
