//! # Scan Agent
//!
//! Runs one [`InputAggregator`] on its own tokio task and drives its idle
//! timer.
//!
//! ## Agent Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ScanAgentHandle ──── ScanCommand ────► mpsc ──┐                       │
//! │   (cloneable)                                   │                       │
//! │                                                 ▼                       │
//! │                              ┌────────────────────────────────────┐     │
//! │                              │ select! {                          │     │
//! │                              │   sleep_until(idle_deadline) ──►   │     │
//! │                              │       aggregator.poll(now)         │     │
//! │                              │   cmd_rx.recv() ──►                │     │
//! │                              │       aggregator.on_*(.., now)     │     │
//! │                              │ }                                  │     │
//! │                              └────────────────────────────────────┘     │
//! │                                                                         │
//! │   Every event for one aggregator runs on this single task, so the       │
//! │   idle timer can never race a fragment.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::aggregator::{duration_ms, AggregatorConfig, InputAggregator, ScanOutcome, TerminalKey};
use crate::error::{ScannerError, ScannerResult};
use crate::field::{CommitHandler, HostField};

/// Command channel capacity.
const COMMAND_BUFFER: usize = 256;

// =============================================================================
// Handle & Commands
// =============================================================================

/// Handle for feeding input events to a running agent.
#[derive(Clone)]
pub struct ScanAgentHandle {
    cmd_tx: mpsc::Sender<ScanCommand>,
}

/// Commands for the agent.
#[derive(Debug)]
enum ScanCommand {
    Fragment(String),
    TerminalKey { key: TerminalKey, pending: String },
    FieldChangeCompleted { pending: String },
    Paste(String),
    Reset,
    Shutdown,
}

impl ScanAgentHandle {
    /// Delivers newly typed text.
    pub async fn fragment(&self, text: impl Into<String>) -> ScannerResult<()> {
        self.send(ScanCommand::Fragment(text.into())).await
    }

    /// Reports an Enter/Tab key-down with the field's undelivered text.
    pub async fn terminal_key(&self, key: TerminalKey, pending: impl Into<String>) -> ScannerResult<()> {
        self.send(ScanCommand::TerminalKey {
            key,
            pending: pending.into(),
        })
        .await
    }

    /// Reports a completed field change.
    pub async fn field_change_completed(&self, pending: impl Into<String>) -> ScannerResult<()> {
        self.send(ScanCommand::FieldChangeCompleted {
            pending: pending.into(),
        })
        .await
    }

    /// Delivers pasted text.
    pub async fn paste(&self, text: impl Into<String>) -> ScannerResult<()> {
        self.send(ScanCommand::Paste(text.into())).await
    }

    /// Drops the current session without committing.
    pub async fn reset(&self) -> ScannerResult<()> {
        self.send(ScanCommand::Reset).await
    }

    /// Shuts down the agent. A half-finished scan is discarded.
    pub async fn shutdown(&self) -> ScannerResult<()> {
        self.send(ScanCommand::Shutdown).await
    }

    /// Returns true once the agent task has stopped.
    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    /// Waits until the agent task has stopped.
    pub async fn closed(&self) {
        self.cmd_tx.closed().await
    }

    async fn send(&self, cmd: ScanCommand) -> ScannerResult<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ScannerError::ChannelError("Scan agent channel closed".into()))
    }
}

// =============================================================================
// Scan Agent
// =============================================================================

/// Owns one aggregator and processes its events sequentially.
pub struct ScanAgent<F, C> {
    /// Label for log lines ("auto_add", "manual_entry", ...).
    name: String,
    aggregator: InputAggregator<F, C>,
}

impl<F, C> ScanAgent<F, C>
where
    F: HostField + Send + 'static,
    C: CommitHandler + Send + 'static,
{
    /// Creates a new agent.
    pub fn new(name: impl Into<String>, config: AggregatorConfig, field: F, handler: C) -> Self {
        ScanAgent {
            name: name.into(),
            aggregator: InputAggregator::new(config, field, handler),
        }
    }

    /// Starts the agent and returns a handle.
    pub fn start(self) -> ScanAgentHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

        tokio::spawn(async move {
            self.run(cmd_rx).await;
        });

        ScanAgentHandle { cmd_tx }
    }

    /// Main agent loop.
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<ScanCommand>) {
        info!(
            agent = %self.name,
            policy = %self.aggregator.config().length_policy,
            idle_ms = duration_ms(self.aggregator.config().idle_timeout),
            "Scan agent started"
        );

        loop {
            let deadline = self.aggregator.idle_deadline().map(Instant::from_std);

            tokio::select! {
                biased;

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(outcome) = self.aggregator.poll(Instant::now().into_std()) {
                        self.log_outcome("idle", &outcome);
                    }
                }
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!(agent = %self.name, "All scan agent handles dropped");
                        break;
                    };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
            }
        }

        self.aggregator.reset();
        info!(agent = %self.name, "Scan agent stopped");
    }

    /// Applies one command. Returns false on shutdown.
    fn handle_command(&mut self, cmd: ScanCommand) -> bool {
        let now = Instant::now().into_std();

        let outcome = match cmd {
            ScanCommand::Fragment(text) => self.aggregator.on_fragment(&text, now),
            ScanCommand::TerminalKey { key, pending } => {
                self.aggregator.on_terminal_key(key, &pending, now)
            }
            ScanCommand::FieldChangeCompleted { pending } => {
                self.aggregator.on_field_change_completed(&pending, now)
            }
            ScanCommand::Paste(text) => self.aggregator.on_paste(&text, now),
            ScanCommand::Reset => {
                self.aggregator.reset();
                return true;
            }
            ScanCommand::Shutdown => {
                info!(agent = %self.name, "Scan agent shutting down");
                return false;
            }
        };

        self.log_outcome("command", &outcome);
        true
    }

    fn log_outcome(&self, source: &str, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::Committed(code) => {
                debug!(agent = %self.name, source, code = %code, "Commit delivered")
            }
            ScanOutcome::Discarded(e) => {
                debug!(agent = %self.name, source, reason = e.reason(), "Scan dropped")
            }
            ScanOutcome::Pending | ScanOutcome::Ignored => {}
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use shelfscan_core::BarcodeCode;
    use tokio::time::sleep;

    use crate::field::TextField;

    fn spawn_agent(config: AggregatorConfig) -> (ScanAgentHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = move |code: &BarcodeCode| {
            let _ = tx.send(code.to_string());
        };
        let handle = ScanAgent::new("test", config, TextField::new(), handler).start();
        (handle, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_commit() {
        let (handle, mut rx) = spawn_agent(AggregatorConfig::manual_entry());
        let started = Instant::now();

        for frag in ["400", "638", "133", "393", "1"] {
            handle.fragment(frag).await.unwrap();
            sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(rx.recv().await.as_deref(), Some("4006381333931"));
        // Last fragment at 200 ms + 120 ms idle window.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(320));
        assert!(elapsed < Duration::from_millis(330));

        handle.shutdown().await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_typing_is_discarded() {
        let (handle, mut rx) = spawn_agent(AggregatorConfig::manual_entry());

        for _ in 0..42 {
            handle.fragment("1").await.unwrap();
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_millis(500)).await;

        handle.shutdown().await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminator_commits_without_waiting() {
        let (handle, mut rx) = spawn_agent(AggregatorConfig::auto_add());
        let started = Instant::now();

        handle.fragment("96385074\r\n").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("96385074"));
        assert_eq!(started.elapsed(), Duration::ZERO);

        handle.shutdown().await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_and_paste_commands() {
        let (handle, mut rx) = spawn_agent(AggregatorConfig::manual_entry());

        handle.fragment("9638").await.unwrap();
        handle.terminal_key(TerminalKey::Enter, "5074").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("96385074"));

        handle.paste("049000028911").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("0049000028911"));

        handle.field_change_completed("4006381333931").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("4006381333931"));

        handle.shutdown().await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_drops_session() {
        let (handle, mut rx) = spawn_agent(AggregatorConfig::manual_entry());

        handle.fragment("4006381333931").await.unwrap();
        handle.reset().await.unwrap();
        sleep(Duration::from_millis(500)).await;

        handle.shutdown().await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_after_shutdown() {
        let (handle, mut rx) = spawn_agent(AggregatorConfig::default());

        handle.shutdown().await.unwrap();
        handle.closed().await;
        assert_eq!(rx.recv().await, None);

        assert!(handle.is_closed());
        let err = handle.fragment("1").await.unwrap_err();
        assert!(matches!(err, ScannerError::ChannelError(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_agents() {
        let (strict, mut strict_rx) = spawn_agent(AggregatorConfig::auto_add());
        let (padded, mut padded_rx) = spawn_agent(AggregatorConfig::manual_entry());

        strict.fragment("049000028911").await.unwrap();
        padded.fragment("049000028911").await.unwrap();

        assert_eq!(padded_rx.recv().await.as_deref(), Some("0049000028911"));

        strict.shutdown().await.unwrap();
        assert_eq!(strict_rx.recv().await, None);
        padded.shutdown().await.unwrap();
    }
}
