//! # shelfscan-input: Scan Aggregation Engine for Shelf Scan
//!
//! A barcode scanner in HID mode is just a very fast keyboard. This crate
//! reconstructs one code per physical scan from the key stream it produces
//! and hands that code, validated, to a commit handler.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Engine Architecture                         │
//! │                                                                         │
//! │   host field events                                                     │
//! │   (fragment, Enter/Tab, change, paste)                                  │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌────────────────┐      ┌──────────────────┐      ┌────────────────┐  │
//! │  │ ScanAgentHandle│─────►│    ScanAgent     │─────►│InputAggregator │  │
//! │  │  (cloneable)   │ mpsc │ select! + sleep  │      │ (sync state    │  │
//! │  └────────────────┘      │ until deadline   │      │  machine)      │  │
//! │                          └──────────────────┘      └───────┬────────┘  │
//! │                                                            │           │
//! │                    shelfscan_core::BarcodeValidator ◄──────┤           │
//! │                                                            ▼           │
//! │                                                   CommitHandler        │
//! │                                                   (≤ 1 call per scan)  │
//! │                                                                         │
//! │  Two agents per station: AUTO-ADD (strict) and MANUAL ENTRY (padded).  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`aggregator`] - `InputAggregator` state machine and its outcomes
//! - [`agent`] - Tokio task driving one aggregator and its idle timer
//! - [`config`] - Scanner configuration (timing, per-profile policy)
//! - [`error`] - Scanner error types
//! - [`field`] - `HostField` and `CommitHandler` seams
//! - [`filter`] - Digit-only editing filter and terminator helpers
//!
//! ## Example
//! ```rust
//! use std::time::Instant;
//! use shelfscan_input::{AggregatorConfig, InputAggregator, TextField};
//! use shelfscan_core::BarcodeCode;
//!
//! let mut added = Vec::new();
//! let mut agg = InputAggregator::new(
//!     AggregatorConfig::auto_add(),
//!     TextField::new(),
//!     |code: &BarcodeCode| added.push(code.to_string()),
//! );
//!
//! agg.on_fragment("4006381333931\n", Instant::now());
//! drop(agg);
//! assert_eq!(added, vec!["4006381333931".to_string()]);
//! ```

pub mod agent;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;

// Re-exports
pub use agent::{ScanAgent, ScanAgentHandle};
pub use aggregator::{
    AggregatorConfig, CommitTrigger, InputAggregator, ScanOutcome, ScanState, TerminalKey,
};
pub use config::{ScanProfile, ScannerConfig};
pub use error::{ScannerError, ScannerResult};
pub use field::{CommitHandler, HostField, TextField};
pub use filter::FilterDecision;
