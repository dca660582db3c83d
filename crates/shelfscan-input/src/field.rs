//! # Host Field & Commit Handler
//!
//! The two seams between the aggregator and the surrounding UI.
//!
//! ```text
//! ┌──────────────┐  set_value / clear   ┌─────────────────┐
//! │  HostField   │ ◄─────────────────── │ InputAggregator │
//! └──────────────┘                      └────────┬────────┘
//!                                                │ on_scan_committed(code)
//!                                                ▼
//!                                       ┌─────────────────┐
//!                                       │  CommitHandler  │  add button,
//!                                       └─────────────────┘  addition list, ...
//! ```

use std::sync::{Arc, Mutex};

use shelfscan_core::BarcodeCode;

// =============================================================================
// Host Field
// =============================================================================

/// The visible input field a scanner types into.
///
/// The aggregator clears it whenever a session ends and, on a successful
/// commit, shows the normalized code while the commit handler runs.
pub trait HostField {
    /// Current text of the field.
    fn value(&self) -> String;

    /// Replaces the text of the field.
    fn set_value(&mut self, value: &str);

    /// Empties the field.
    fn clear(&mut self) {
        self.set_value("");
    }
}

/// Plain in-memory field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostField for TextField {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value.clear();
        self.value.push_str(value);
    }
}

/// A field shared with the UI side (e.g. the agent owns one clone, the
/// renderer reads another).
impl<F: HostField> HostField for Arc<Mutex<F>> {
    fn value(&self) -> String {
        self.lock().unwrap_or_else(|e| e.into_inner()).value()
    }

    fn set_value(&mut self, value: &str) {
        self.lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_value(value);
    }
}

// =============================================================================
// Commit Handler
// =============================================================================

/// Receives exactly one call per committed physical scan.
pub trait CommitHandler {
    fn on_scan_committed(&mut self, code: &BarcodeCode);
}

impl<T> CommitHandler for T
where
    T: FnMut(&BarcodeCode),
{
    fn on_scan_committed(&mut self, code: &BarcodeCode) {
        self(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field() {
        let mut field = TextField::new();
        field.set_value("4006381333931");
        assert_eq!(field.value(), "4006381333931");
        field.clear();
        assert_eq!(field.value(), "");
    }

    #[test]
    fn test_shared_field() {
        let shared = Arc::new(Mutex::new(TextField::new()));
        let mut writer = shared.clone();
        writer.set_value("96385074");
        assert_eq!(shared.value(), "96385074");
    }

    #[test]
    fn test_closure_handler() {
        let mut seen = Vec::new();
        {
            let mut handler = |code: &BarcodeCode| seen.push(code.to_string());
            let code: BarcodeCode = "96385074".parse().unwrap();
            handler.on_scan_committed(&code);
        }
        assert_eq!(seen, vec!["96385074".to_string()]);
    }
}
