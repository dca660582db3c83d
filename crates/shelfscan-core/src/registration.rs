//! # Registration Module
//!
//! The pending addition list behind the product registration modal, and the
//! summary of what the registration endpoint did with it.
//!
//! ## Registration Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Registration Flow                            │
//! │                                                                         │
//! │  Scanner commit ──► push_scanned() ──┐                                 │
//! │  Manual field  ───► add_manual()  ───┼──► AdditionList (unique JANs)   │
//! │  Handy CSV     ───► import_csv()  ───┘          │                      │
//! │                                                 ▼                      │
//! │                               registration_request(shelf_id)           │
//! │                                                 │  POST /products      │
//! │                                                 ▼  (external)          │
//! │                               RegistrationSummary::from_response()    │
//! │                                                 │                      │
//! │                                                 ▼                      │
//! │                               retain_failed() ─► only failures remain  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{BarcodeError, RegistrationError};
use crate::types::{BarcodeCode, PendingProduct, ProductSource};
use crate::validation::BarcodeValidator;

// =============================================================================
// Addition List
// =============================================================================

/// Result of offering a code to the addition list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Inserted as a new entry.
    Added(BarcodeCode),
    /// Already pending; nothing changed.
    Duplicate(BarcodeCode),
    /// Not a valid code; nothing changed. Not shown to the operator.
    Rejected(BarcodeError),
}

impl AddOutcome {
    /// Returns true if a new entry was inserted.
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added(_))
    }
}

/// Products waiting to be registered, unique by JAN.
///
/// ## Ordering
/// Manual and scanned entries go to the front (newest first, as the modal
/// lists them); CSV imports are appended in file order.
#[derive(Debug, Clone, Default)]
pub struct AdditionList {
    items: Vec<PendingProduct>,
    validator: BarcodeValidator,
}

impl AdditionList {
    /// Creates an empty list using the padding-tolerant validator.
    pub fn new() -> Self {
        AdditionList {
            items: Vec::new(),
            validator: BarcodeValidator::padding(),
        }
    }

    /// Validates a typed JAN and inserts it at the front.
    ///
    /// Invalid input is rejected without an operator-facing error; a
    /// misread should not interrupt the workflow.
    pub fn add_manual(&mut self, shelf_id: &str, raw: &str) -> AddOutcome {
        match self.validator.validate(raw) {
            Ok(code) => self.insert_front(shelf_id, code, ProductSource::ManualInput),
            Err(e) => AddOutcome::Rejected(e),
        }
    }

    /// Inserts a code committed by a scan agent at the front.
    pub fn push_scanned(&mut self, shelf_id: &str, code: BarcodeCode) -> AddOutcome {
        self.insert_front(shelf_id, code, ProductSource::Scanner)
    }

    /// Appends an already validated code, skipping duplicates.
    pub(crate) fn push_back(
        &mut self,
        shelf_id: &str,
        code: BarcodeCode,
        source: ProductSource,
    ) -> AddOutcome {
        if self.contains(&code) {
            return AddOutcome::Duplicate(code);
        }
        self.items
            .push(PendingProduct::new(shelf_id, code.clone(), source));
        AddOutcome::Added(code)
    }

    fn insert_front(
        &mut self,
        shelf_id: &str,
        code: BarcodeCode,
        source: ProductSource,
    ) -> AddOutcome {
        if self.contains(&code) {
            return AddOutcome::Duplicate(code);
        }
        self.items
            .insert(0, PendingProduct::new(shelf_id, code.clone(), source));
        AddOutcome::Added(code)
    }

    /// Returns true if `code` is already pending.
    pub fn contains(&self, code: &BarcodeCode) -> bool {
        self.items.iter().any(|item| &item.jan == code)
    }

    /// Removes the entry at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<PendingProduct> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingProduct> {
        self.items.iter()
    }

    /// Entries as a slice, in display order.
    pub fn items(&self) -> &[PendingProduct] {
        &self.items
    }

    /// Builds the payload for the registration endpoint.
    pub fn registration_request(&self, shelf_id: &str) -> RegistrationRequest {
        RegistrationRequest {
            shelf_id: shelf_id.to_string(),
            products: self
                .items
                .iter()
                .map(|item| RegistrationProduct {
                    jan: item.jan.to_string(),
                })
                .collect(),
        }
    }

    /// Keeps only the entries that were not registered successfully.
    pub fn retain_failed(&mut self, summary: &RegistrationSummary) {
        self.items
            .retain(|item| !summary.successful.iter().any(|s| s.jan == item.jan.as_str()));
    }
}

// =============================================================================
// Wire Shapes
// =============================================================================

/// Body of the product registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationRequest {
    pub shelf_id: String,
    pub products: Vec<RegistrationProduct>,
}

/// One product in a [`RegistrationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationProduct {
    pub jan: String,
}

/// Per-product result returned by the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationOutcome {
    pub jan: String,
    pub status: RegistrationStatus,
    #[serde(default)]
    #[ts(type = "unknown")]
    pub id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RegistrationResponse {
    results: Option<Vec<RegistrationOutcome>>,
}

// =============================================================================
// Registration Status
// =============================================================================

/// Status the endpoint reports for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Success,
    Duplicate,
    InvalidJan,
    NotFound,
    /// Any status string this client does not know.
    #[serde(other)]
    Other,
}

impl RegistrationStatus {
    /// Operator-facing message for this status.
    pub fn message(&self, jan: &str) -> String {
        match self {
            RegistrationStatus::Success => "success".to_string(),
            RegistrationStatus::Duplicate => format!("duplicate ({} is already registered)", jan),
            RegistrationStatus::InvalidJan => "invalid JAN code".to_string(),
            RegistrationStatus::NotFound => "product information not found".to_string(),
            RegistrationStatus::Other => "error".to_string(),
        }
    }
}

// =============================================================================
// Registration Summary
// =============================================================================

/// A registered (or rejected) product, joined with its pending entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredProduct {
    pub shelf_id: String,
    pub jan: String,
    pub product_name: String,
    pub status: RegistrationStatus,
    #[ts(type = "unknown")]
    pub id: Option<serde_json::Value>,
    /// Failure message; `None` for successes.
    pub error: Option<String>,
}

/// Partition of the endpoint results into successes and failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationSummary {
    pub successful: Vec<RegisteredProduct>,
    pub failed: Vec<RegisteredProduct>,
}

impl RegistrationSummary {
    /// Joins endpoint results with the pending list.
    ///
    /// Results for JANs that were never pending are ignored.
    pub fn summarize(results: &[RegistrationOutcome], pending: &AdditionList) -> Self {
        let mut summary = RegistrationSummary::default();

        for result in results {
            let Some(original) = pending.iter().find(|p| p.jan.as_str() == result.jan) else {
                continue;
            };

            let mut product = RegisteredProduct {
                shelf_id: original.shelf_id.clone(),
                jan: result.jan.clone(),
                product_name: original.product_name.clone(),
                status: result.status.clone(),
                id: result.id.clone(),
                error: None,
            };

            if result.status == RegistrationStatus::Success {
                summary.successful.push(product);
            } else {
                product.error = Some(result.status.message(&result.jan));
                summary.failed.push(product);
            }
        }

        summary
    }

    /// Parses the endpoint's JSON reply and summarizes it.
    pub fn from_response(body: &str, pending: &AdditionList) -> Result<Self, RegistrationError> {
        let response: RegistrationResponse = serde_json::from_str(body)?;
        let results = response.results.ok_or_else(|| {
            RegistrationError::MalformedResponse("missing `results` array".to_string())
        })?;
        Ok(Self::summarize(&results, pending))
    }

    /// Operator-facing summary text.
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Registration finished:\n  succeeded {} / failed {}",
            self.successful.len(),
            self.failed.len()
        );
        if !self.failed.is_empty() {
            msg.push_str("\n\nFailures:\n");
            for failure in &self.failed {
                msg.push_str(&format!(
                    "- {} : {}\n",
                    failure.jan,
                    failure.error.as_deref().unwrap_or("error")
                ));
            }
        }
        msg
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
