//! # Input Aggregator Module
//!
//! Reassembles the fragments of one physical scan into a single string and
//! decides when the scan is complete.
//!
//! A HID scanner "types" a code in a burst of a few milliseconds, usually
//! followed by CR/LF/TAB. The host may coalesce that burst into one input
//! event or split it into many. Humans type into the same field, only much
//! slower. The aggregator tells the two apart with an idle window and a
//! maximum scan duration.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            fragment                       fragment (no terminator)      │
//! │   ┌──────┐ ───────────────► ┌──────────────┐ ──┐                        │
//! │   │ IDLE │                  │ ACCUMULATING │   │ append, reschedule     │
//! │   └──────┘ ◄─────────────── └──────────────┘ ◄─┘ idle deadline          │
//! │       ▲     commit / discard        │                                   │
//! │       │                             │                                   │
//! │       │   ┌─────────────────────────┴─────────────────────────────┐     │
//! │       │   │ • fragment ends with CR/LF/TAB      → commit now      │     │
//! │       │   │ • Enter/Tab key, change, paste      → commit now      │     │
//! │       │   │ • idle 120 ms, elapsed ≤ 2000 ms    → commit          │     │
//! │       │   │ • idle 120 ms, elapsed > 2000 ms    → discard         │     │
//! │       │   └───────────────────────────────────────────────────────┘     │
//! │       │                                                                 │
//! │       └── commit: strip terminators → validate → handler (or discard)  │
//! │           every exit clears the host field                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timing Model
//! The aggregator never sleeps. Every event carries `now`, and the single
//! outstanding idle timer is represented by [`InputAggregator::idle_deadline`].
//! A driver (see [`ScanAgent`](crate::agent::ScanAgent)) waits for that
//! deadline and calls [`InputAggregator::on_idle_timeout`]. Each fragment
//! replaces the deadline, so at most one timer is ever pending.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace};
use uuid::Uuid;

use shelfscan_core::{BarcodeCode, BarcodeValidator, LengthPolicy, ScanError};

use crate::field::{CommitHandler, HostField};
use crate::filter::{self, FilterDecision};

// =============================================================================
// Constants
// =============================================================================

/// Default idle window after which buffered input counts as complete.
pub const DEFAULT_IDLE_MS: u64 = 120;

/// Default longest a single scan may take before it is treated as typing.
pub const DEFAULT_MAX_SCAN_DURATION_MS: u64 = 2000;

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// Aggregator Configuration
// =============================================================================

/// Configuration for one input aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Silence after the last fragment that completes a scan.
    pub idle_timeout: Duration,
    /// Longest session that may still commit on idle.
    pub max_scan_duration: Duration,
    /// Validator variant applied at commit time.
    pub length_policy: LengthPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_MS),
            max_scan_duration: Duration::from_millis(DEFAULT_MAX_SCAN_DURATION_MS),
            length_policy: LengthPolicy::PadToEan13,
        }
    }
}

impl AggregatorConfig {
    /// Map view auto-add scanner: only native 8/13-digit codes commit.
    pub fn auto_add() -> Self {
        AggregatorConfig {
            length_policy: LengthPolicy::Strict,
            ..Self::default()
        }
    }

    /// Registration modal: short merchant codes are padded to EAN-13.
    pub fn manual_entry() -> Self {
        AggregatorConfig {
            length_policy: LengthPolicy::PadToEan13,
            ..Self::default()
        }
    }
}

// =============================================================================
// Events & Outcomes
// =============================================================================

/// Keys that end a scan when pressed in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKey {
    Enter,
    Tab,
}

impl std::fmt::Display for TerminalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalKey::Enter => write!(f, "enter"),
            TerminalKey::Tab => write!(f, "tab"),
        }
    }
}

/// What completed a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    Terminator,
    Key(TerminalKey),
    FieldChange,
    Paste,
    Idle,
}

impl std::fmt::Display for CommitTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitTrigger::Terminator => write!(f, "terminator"),
            CommitTrigger::Key(key) => write!(f, "keydown:{}", key),
            CommitTrigger::FieldChange => write!(f, "change"),
            CommitTrigger::Paste => write!(f, "paste"),
            CommitTrigger::Idle => write!(f, "idle"),
        }
    }
}

/// Result of feeding one event to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Buffered; waiting for more input or the idle deadline.
    Pending,
    /// Session completed and the commit handler was called.
    Committed(BarcodeCode),
    /// Session ended without a commit.
    Discarded(ScanError),
    /// Event had nothing to act on (stale timer, empty paste).
    Ignored,
}

impl ScanOutcome {
    /// The committed code, if any.
    pub fn committed(&self) -> Option<&BarcodeCode> {
        match self {
            ScanOutcome::Committed(code) => Some(code),
            _ => None,
        }
    }
}

/// Coarse aggregator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Accumulating,
}

// =============================================================================
// Scan Session
// =============================================================================

/// The fragments gathered so far for one physical scan.
///
/// Only exists while accumulating, so an idle aggregator has no buffer.
#[derive(Debug, Clone)]
struct ScanSession {
    /// Correlates log lines of one scan.
    id: Uuid,
    buffer: String,
    started_at: Instant,
}

impl ScanSession {
    fn begin(now: Instant) -> Self {
        let session = ScanSession {
            id: Uuid::new_v4(),
            buffer: String::new(),
            started_at: now,
        };
        trace!(session = %session.id, "Scan session started");
        session
    }
}

// =============================================================================
// Input Aggregator
// =============================================================================

/// Turns raw input events into at most one commit per physical scan.
///
/// Generic over the [`HostField`] it clears and the [`CommitHandler`] it
/// calls, so the map-view auto-add scanner and the registration modal share
/// one implementation and differ only in configuration.
pub struct InputAggregator<F, C> {
    config: AggregatorConfig,
    validator: BarcodeValidator,
    session: Option<ScanSession>,
    idle_deadline: Option<Instant>,
    field: F,
    handler: C,
}

impl<F, C> InputAggregator<F, C>
where
    F: HostField,
    C: CommitHandler,
{
    /// Creates an idle aggregator.
    pub fn new(config: AggregatorConfig, field: F, handler: C) -> Self {
        InputAggregator {
            validator: BarcodeValidator::new(config.length_policy),
            config,
            session: None,
            idle_deadline: None,
            field,
            handler,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        if self.session.is_some() {
            ScanState::Accumulating
        } else {
            ScanState::Idle
        }
    }

    /// Text buffered in the current session (empty when idle).
    pub fn buffer(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.buffer.as_str())
    }

    /// When the pending idle timer fires, if one is scheduled.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_deadline
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    // =========================================================================
    // Input Events
    // =========================================================================

    /// Digit-only editing filter for the host field.
    pub fn on_character_proposed(&self, ch: char) -> FilterDecision {
        filter::on_character_proposed(ch)
    }

    /// Newly delivered text from the field.
    ///
    /// A fragment ending with CR/LF/TAB completes the scan immediately;
    /// otherwise the idle deadline is (re)scheduled.
    pub fn on_fragment(&mut self, text: &str, now: Instant) -> ScanOutcome {
        self.session_mut(now).buffer.push_str(text);

        if filter::ends_with_terminator(text) {
            return self.complete(CommitTrigger::Terminator);
        }

        self.idle_deadline = Some(now + self.config.idle_timeout);
        ScanOutcome::Pending
    }

    /// Enter or Tab pressed; `pending` is whatever the field holds that has
    /// not been delivered as a fragment yet.
    pub fn on_terminal_key(&mut self, key: TerminalKey, pending: &str, now: Instant) -> ScanOutcome {
        self.session_mut(now).buffer.push_str(pending);
        self.complete(CommitTrigger::Key(key))
    }

    /// The field reported a completed change.
    pub fn on_field_change_completed(&mut self, pending: &str, now: Instant) -> ScanOutcome {
        self.session_mut(now).buffer.push_str(pending);
        self.complete(CommitTrigger::FieldChange)
    }

    /// Pasted text replaces the buffer and commits at once.
    pub fn on_paste(&mut self, text: &str, now: Instant) -> ScanOutcome {
        if text.is_empty() {
            return ScanOutcome::Ignored;
        }

        let mut session = ScanSession::begin(now);
        session.buffer.push_str(text);
        self.session = Some(session);
        self.complete(CommitTrigger::Paste)
    }

    /// The idle deadline elapsed.
    ///
    /// Commits if the session is still within the maximum scan duration,
    /// otherwise discards it as human typing.
    pub fn on_idle_timeout(&mut self, now: Instant) -> ScanOutcome {
        self.idle_deadline = None;

        let Some(session) = self.session.as_ref() else {
            return ScanOutcome::Ignored;
        };

        let elapsed = now.saturating_duration_since(session.started_at);
        if elapsed <= self.config.max_scan_duration {
            return self.complete(CommitTrigger::Idle);
        }

        let err = ScanError::TimedOut {
            elapsed_ms: duration_ms(elapsed),
            limit_ms: duration_ms(self.config.max_scan_duration),
        };
        self.discard(err)
    }

    /// Fires the idle timeout if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ScanOutcome> {
        match self.idle_deadline {
            Some(deadline) if now >= deadline => Some(self.on_idle_timeout(now)),
            _ => None,
        }
    }

    /// Drops any session without committing.
    pub fn reset(&mut self) {
        self.idle_deadline = None;
        if let Some(session) = self.session.take() {
            debug!(session = %session.id, "Scan session reset");
        }
        self.field.clear();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn session_mut(&mut self, now: Instant) -> &mut ScanSession {
        self.session.get_or_insert_with(|| ScanSession::begin(now))
    }

    /// Ends the session through the validator.
    fn complete(&mut self, trigger: CommitTrigger) -> ScanOutcome {
        self.idle_deadline = None;

        let Some(session) = self.session.take() else {
            return ScanOutcome::Ignored;
        };

        let text = filter::strip_terminators(&session.buffer);
        match self.validator.validate(text) {
            Ok(code) => {
                info!(
                    session = %session.id,
                    code = %code,
                    trigger = %trigger,
                    "Scan committed"
                );
                self.field.set_value(code.as_str());
                self.handler.on_scan_committed(&code);
                self.field.clear();
                ScanOutcome::Committed(code)
            }
            Err(e) => {
                debug!(
                    session = %session.id,
                    trigger = %trigger,
                    reason = %e,
                    "Scan discarded"
                );
                self.field.clear();
                ScanOutcome::Discarded(ScanError::Invalid(e))
            }
        }
    }

    fn discard(&mut self, err: ScanError) -> ScanOutcome {
        self.idle_deadline = None;
        if let Some(session) = self.session.take() {
            debug!(session = %session.id, reason = %err, "Scan discarded");
        }
        self.field.clear();
        ScanOutcome::Discarded(err)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use shelfscan_core::BarcodeError;

    use crate::field::TextField;

    type Commits = Rc<RefCell<Vec<String>>>;

    fn aggregator(
        config: AggregatorConfig,
    ) -> (InputAggregator<TextField, impl FnMut(&BarcodeCode)>, Commits) {
        let commits: Commits = Rc::new(RefCell::new(Vec::new()));
        let sink = commits.clone();
        let handler = move |code: &BarcodeCode| sink.borrow_mut().push(code.to_string());
        (InputAggregator::new(config, TextField::new(), handler), commits)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_idle_commit_after_burst() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();

        for (i, frag) in ["400", "638", "133", "393", "1"].iter().enumerate() {
            let now = t0 + ms(50 * i as u64);
            assert_eq!(agg.on_fragment(frag, now), ScanOutcome::Pending);
            assert_eq!(agg.idle_deadline(), Some(now + ms(120)));
        }
        assert_eq!(agg.buffer(), "4006381333931");

        // Not yet due.
        let last = t0 + ms(200);
        assert_eq!(agg.poll(last + ms(119)), None);
        assert!(commits.borrow().is_empty());

        let outcome = agg.poll(last + ms(120)).unwrap();
        assert_eq!(outcome.committed().map(|c| c.as_str()), Some("4006381333931"));
        assert_eq!(*commits.borrow(), vec!["4006381333931".to_string()]);
        assert_eq!(agg.state(), ScanState::Idle);
        assert_eq!(agg.idle_deadline(), None);
        assert_eq!(agg.field().value(), "");
    }

    #[test]
    fn test_max_duration_guard_discards() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();

        // 42 fragments 50 ms apart span 2050 ms before going idle.
        for i in 0..42 {
            agg.on_fragment("1", t0 + ms(50 * i));
        }

        let outcome = agg.on_idle_timeout(t0 + ms(2050 + 120));
        assert!(matches!(
            outcome,
            ScanOutcome::Discarded(ScanError::TimedOut { limit_ms: 2000, .. })
        ));
        assert!(commits.borrow().is_empty());
        assert_eq!(agg.state(), ScanState::Idle);
        assert_eq!(agg.buffer(), "");
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(ms(2000)), 2000);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_guard_is_inclusive() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();
        agg.on_fragment("4006381333931", t0);

        let outcome = agg.on_idle_timeout(t0 + ms(2000));
        assert!(outcome.committed().is_some());
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn test_terminator_commits_immediately() {
        let (mut agg, commits) = aggregator(AggregatorConfig::auto_add());
        let t0 = Instant::now();

        assert_eq!(agg.on_fragment("400638", t0), ScanOutcome::Pending);
        let outcome = agg.on_fragment("1333931\r\n", t0 + ms(5));

        assert_eq!(outcome.committed().map(|c| c.as_str()), Some("4006381333931"));
        assert_eq!(agg.idle_deadline(), None);
        assert_eq!(*commits.borrow(), vec!["4006381333931".to_string()]);

        // The cancelled timer has nothing left to fire.
        assert_eq!(agg.poll(t0 + ms(500)), None);
        assert_eq!(agg.on_idle_timeout(t0 + ms(500)), ScanOutcome::Ignored);
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn test_terminator_skips_duration_guard() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();
        agg.on_fragment("9638", t0);
        agg.on_fragment("5074\t", t0 + ms(5000));
        assert_eq!(*commits.borrow(), vec!["96385074".to_string()]);
    }

    #[test]
    fn test_terminal_key_appends_pending_text() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();

        agg.on_fragment("9638", t0);
        let outcome = agg.on_terminal_key(TerminalKey::Enter, "5074", t0 + ms(10));
        assert_eq!(outcome.committed().map(|c| c.as_str()), Some("96385074"));

        // Tab on an idle aggregator with text in the field.
        let outcome = agg.on_terminal_key(TerminalKey::Tab, "4006381333931", t0 + ms(500));
        assert!(outcome.committed().is_some());
        assert_eq!(commits.borrow().len(), 2);
    }

    #[test]
    fn test_terminal_key_on_empty_field_discards() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let outcome = agg.on_terminal_key(TerminalKey::Enter, "", Instant::now());
        assert_eq!(
            outcome,
            ScanOutcome::Discarded(ScanError::Invalid(BarcodeError::EmptyInput))
        );
        assert!(commits.borrow().is_empty());
    }

    #[test]
    fn test_field_change_commits() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let outcome = agg.on_field_change_completed("049000028911", Instant::now());
        assert_eq!(outcome.committed().map(|c| c.as_str()), Some("0049000028911"));
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn test_paste_replaces_buffer() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();

        agg.on_fragment("12", t0);
        let outcome = agg.on_paste("96385074", t0 + ms(10));
        assert_eq!(outcome.committed().map(|c| c.as_str()), Some("96385074"));
        assert_eq!(*commits.borrow(), vec!["96385074".to_string()]);
        assert_eq!(agg.idle_deadline(), None);

        assert_eq!(agg.on_paste("", t0 + ms(20)), ScanOutcome::Ignored);
    }

    #[test]
    fn test_invalid_scan_discarded_silently() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let outcome = agg.on_fragment("96385075\n", Instant::now());
        assert!(matches!(
            outcome,
            ScanOutcome::Discarded(ScanError::Invalid(BarcodeError::ChecksumMismatch { .. }))
        ));
        assert!(commits.borrow().is_empty());
        assert_eq!(agg.field().value(), "");
        assert_eq!(agg.state(), ScanState::Idle);
    }

    #[test]
    fn test_bare_terminator_discards_empty() {
        let (mut agg, commits) = aggregator(AggregatorConfig::auto_add());
        let outcome = agg.on_fragment("\r\n", Instant::now());
        assert_eq!(
            outcome,
            ScanOutcome::Discarded(ScanError::Invalid(BarcodeError::EmptyInput))
        );
        assert!(commits.borrow().is_empty());
    }

    #[test]
    fn test_strict_profile_rejects_short_codes() {
        let (mut strict, strict_commits) = aggregator(AggregatorConfig::auto_add());
        let (mut padded, padded_commits) = aggregator(AggregatorConfig::manual_entry());
        let now = Instant::now();

        let outcome = strict.on_fragment("049000028911\n", now);
        assert_eq!(
            outcome,
            ScanOutcome::Discarded(ScanError::Invalid(BarcodeError::UnsupportedLength {
                len: 12
            }))
        );
        padded.on_fragment("049000028911\n", now);

        assert!(strict_commits.borrow().is_empty());
        assert_eq!(*padded_commits.borrow(), vec!["0049000028911".to_string()]);
    }

    #[test]
    fn test_fragment_reschedules_single_deadline() {
        let (mut agg, _commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();

        agg.on_fragment("4", t0);
        agg.on_fragment("0", t0 + ms(100));
        assert_eq!(agg.idle_deadline(), Some(t0 + ms(220)));

        // The first deadline (t0 + 120) no longer fires.
        assert_eq!(agg.poll(t0 + ms(150)), None);
        assert_eq!(agg.state(), ScanState::Accumulating);
    }

    #[test]
    fn test_at_most_one_commit_per_session() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();

        agg.on_fragment("4006381333931", t0);
        agg.on_terminal_key(TerminalKey::Enter, "", t0 + ms(1));
        agg.on_field_change_completed("", t0 + ms(2));
        agg.poll(t0 + ms(500));

        // Enter committed; change started a new, empty session and discarded it.
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn test_handler_sees_code_in_field() {
        let field = std::sync::Arc::new(std::sync::Mutex::new(TextField::new()));
        let observed = Rc::new(RefCell::new(String::new()));

        let reader = field.clone();
        let sink = observed.clone();
        let handler = move |_: &BarcodeCode| *sink.borrow_mut() = reader.value();

        let mut agg = InputAggregator::new(AggregatorConfig::auto_add(), field.clone(), handler);
        agg.on_fragment("96385074\n", Instant::now());

        assert_eq!(*observed.borrow(), "96385074");
        assert_eq!(field.value(), "");
    }

    #[test]
    fn test_reset_cancels_session() {
        let (mut agg, commits) = aggregator(AggregatorConfig::manual_entry());
        let t0 = Instant::now();
        agg.on_fragment("4006381333931", t0);
        agg.reset();

        assert_eq!(agg.state(), ScanState::Idle);
        assert_eq!(agg.poll(t0 + ms(200)), None);
        assert!(commits.borrow().is_empty());
    }

    #[test]
    fn test_filter_delegation() {
        let (agg, _commits) = aggregator(AggregatorConfig::default());
        assert_eq!(agg.on_character_proposed('5'), FilterDecision::Accept);
        assert_eq!(agg.on_character_proposed('x'), FilterDecision::Reject);
    }
}
