//! # Handy-Terminal CSV Import
//!
//! Bulk-loads JAN codes exported by a handy terminal into an
//! [`AdditionList`].
//!
//! ## File Layout
//! ```text
//! line 1   header (skipped)
//! line 2+  A,B,C,D,E,...      ◄── column E (index 4) holds the JAN
//! ```
//!
//! Unlike the scan path, the import reports every rejected code back to the
//! operator with its line number, because a file is reviewed after the fact
//! rather than during a scanning burst.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::ImportError;
use crate::registration::{AddOutcome, AdditionList};
use crate::types::ProductSource;
use crate::validation::BarcodeValidator;

/// Zero-based index of the JAN column.
pub const JAN_COLUMN: usize = 4;

// =============================================================================
// Import Report
// =============================================================================

/// A line whose JAN failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvalidLine {
    /// 1-based line number in the file, header included.
    pub line_number: usize,
    pub jan: String,
    pub error: String,
}

/// What an import did to the addition list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Newly appended entries.
    pub added: usize,
    /// Valid codes that were already pending.
    pub duplicates: usize,
    /// Rejected codes, in file order.
    pub invalid: Vec<InvalidLine>,
}

impl ImportReport {
    /// Operator-facing summary.
    pub fn summary(&self) -> String {
        let mut msg = format!("Loaded {} JAN codes", self.added);
        if !self.invalid.is_empty() {
            msg.push_str(&format!(
                "\n\n{} JAN codes had errors:\n",
                self.invalid.len()
            ));
            for line in &self.invalid {
                msg.push_str(&format!(
                    "line {}: {} - {}\n",
                    line.line_number, line.jan, line.error
                ));
            }
            msg.push_str("\nCodes with errors were skipped.");
        }
        msg
    }
}

// =============================================================================
// Import
// =============================================================================

/// Parses handy-terminal CSV text into `list`.
///
/// ## Rules
/// - The first line is a header
/// - Lines with fewer than 5 columns or an empty JAN are skipped
/// - JANs are validated with the padding-tolerant validator
/// - Codes already in the list are left in place (so re-importing the same
///   file is harmless)
pub fn import_csv(text: &str, shelf_id: &str, list: &mut AdditionList) -> ImportReport {
    let validator = BarcodeValidator::padding();
    let mut report = ImportReport::default();

    for (index, line) in text.split('\n').enumerate().skip(1) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let columns: Vec<&str> = line.split(',').collect();
        if columns.len() <= JAN_COLUMN {
            continue;
        }

        let jan = columns[JAN_COLUMN].trim();
        if jan.is_empty() {
            continue;
        }

        let line_number = index + 1;
        match validator.validate(jan) {
            Ok(code) => match list.push_back(shelf_id, code, ProductSource::HandyCsv) {
                AddOutcome::Added(_) => report.added += 1,
                _ => report.duplicates += 1,
            },
            Err(e) => {
                warn!(line = line_number, jan = %jan, reason = %e, "Skipping invalid JAN in handy-terminal CSV");
                report.invalid.push(InvalidLine {
                    line_number,
                    jan: jan.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    debug!(
        added = report.added,
        duplicates = report.duplicates,
        invalid = report.invalid.len(),
        "Handy-terminal CSV imported"
    );
    report
}

/// Reads a UTF-8 CSV file and imports it.
pub fn import_file(
    path: impl AsRef<Path>,
    shelf_id: &str,
    list: &mut AdditionList,
) -> Result<ImportReport, ImportError> {
    let text = std::fs::read_to_string(path)?;
    Ok(import_csv(&text, shelf_id, list))
}

// =============================================================================
// Unit Tests
// =============================================================================
