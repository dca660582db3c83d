//! # Station
//!
//! Owns the two scan agents of one station and the state their commit
//! handlers feed: the shelf selection (auto-add) and the addition list
//! (manual entry).
//!
//! ## Console Commands
//! ```text
//! <digits>              fragment for the active agent (commits after idle);
//!                       non-digits are dropped as the field would refuse them
//! :auto | :manual       switch the active agent
//! :enter [text]         Enter key-down with pending text
//! :tab [text]           Tab key-down with pending text
//! :change [text]        field change completed
//! :paste <text>         paste into the active field
//! :add <jan>            manual add to the addition list
//! :check <jan>          print the validation report
//! :import <path>        import a handy-terminal CSV into the addition list
//! :list                 show the addition list
//! :remove <n>           remove entry n (1-based) from the addition list
//! :clear                empty the addition list
//! :request              print the registration request body
//! :results <json>       apply a registration response
//! :export               print the shelf selection as CSV
//! :quit                 stop the station
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use tracing::{debug, info, warn};

use shelfscan_core::export::selection_csv;
use shelfscan_core::import::import_file;
use shelfscan_core::{validate, AddOutcome, AdditionList, BarcodeCode, RegistrationSummary, SelectedProduct};
use shelfscan_input::filter;
use shelfscan_input::{ScanAgent, ScanAgentHandle, ScanProfile, ScannerConfig, TerminalKey, TextField};

// =============================================================================
// Commands
// =============================================================================

/// One console line, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fragment(String),
    Key(TerminalKey, String),
    Change(String),
    Paste(String),
    Target(ScanProfile),
    Add(String),
    Check(String),
    Import(PathBuf),
    List,
    Remove(usize),
    Clear,
    Request,
    Results(String),
    Export,
    Quit,
}

impl Command {
    /// Parses a console line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Some(Command::Fragment(line.to_string())));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let required = |what: &str| -> Result<String, String> {
            if arg.is_empty() {
                Err(format!(":{} needs {}", name, what))
            } else {
                Ok(arg.to_string())
            }
        };

        let cmd = match name {
            "auto" => Command::Target(ScanProfile::AutoAdd),
            "manual" => Command::Target(ScanProfile::ManualEntry),
            "enter" => Command::Key(TerminalKey::Enter, arg.to_string()),
            "tab" => Command::Key(TerminalKey::Tab, arg.to_string()),
            "change" => Command::Change(arg.to_string()),
            "paste" => Command::Paste(required("text")?),
            "add" => Command::Add(required("a JAN")?),
            "check" => Command::Check(required("a JAN")?),
            "import" => Command::Import(PathBuf::from(required("a path")?)),
            "list" => Command::List,
            "remove" => {
                let n: usize = required("an entry number")?
                    .parse()
                    .map_err(|_| format!("not an entry number: {}", arg))?;
                if n == 0 {
                    return Err("entries are numbered from 1".to_string());
                }
                Command::Remove(n)
            }
            "clear" => Command::Clear,
            "request" => Command::Request,
            "results" => Command::Results(required("a JSON body")?),
            "export" => Command::Export,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command :{}", other)),
        };

        Ok(Some(cmd))
    }
}

// =============================================================================
// Station
// =============================================================================

/// Whether the console loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Two scan agents plus the lists they fill.
pub struct Station {
    shelf_id: String,
    target: ScanProfile,
    auto_add: Option<ScanAgentHandle>,
    manual_entry: Option<ScanAgentHandle>,
    additions: Arc<Mutex<AdditionList>>,
    selection: Arc<Mutex<Vec<SelectedProduct>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Station {
    /// Starts the agents enabled in `config`. Must run inside a tokio runtime.
    pub fn start(config: &ScannerConfig, shelf_id: impl Into<String>) -> Self {
        let shelf_id = shelf_id.into();
        let additions = Arc::new(Mutex::new(AdditionList::new()));
        let selection = Arc::new(Mutex::new(Vec::new()));

        let auto_add = config.auto_add.enabled.then(|| {
            let selection = selection.clone();
            let shelf = shelf_id.clone();
            let handler = move |code: &BarcodeCode| {
                let mut selection = lock(&selection);
                if selection.iter().any(|p: &SelectedProduct| p.jan == code.as_str()) {
                    println!("auto-add: {} already on shelf {}", code, shelf);
                    return;
                }
                selection.push(SelectedProduct {
                    shelf_id: shelf.clone(),
                    jan: code.to_string(),
                    product_name: None,
                });
                println!("auto-add: {} -> shelf {}", code, shelf);
            };
            ScanAgent::new(
                ScanProfile::AutoAdd.to_string(),
                config.aggregator_config(ScanProfile::AutoAdd),
                TextField::new(),
                handler,
            )
            .start()
        });

        let manual_entry = config.manual_entry.enabled.then(|| {
            let additions = additions.clone();
            let shelf = shelf_id.clone();
            let handler = move |code: &BarcodeCode| {
                match lock(&additions).push_scanned(&shelf, code.clone()) {
                    AddOutcome::Added(_) => println!("manual: {} added to the addition list", code),
                    AddOutcome::Duplicate(_) => println!("manual: {} is already listed", code),
                    AddOutcome::Rejected(_) => {}
                }
            };
            ScanAgent::new(
                ScanProfile::ManualEntry.to_string(),
                config.aggregator_config(ScanProfile::ManualEntry),
                TextField::new(),
                handler,
            )
            .start()
        });

        let target = if auto_add.is_some() {
            ScanProfile::AutoAdd
        } else {
            ScanProfile::ManualEntry
        };

        info!(shelf = %shelf_id, target = %target, "Station started");

        Station {
            shelf_id,
            target,
            auto_add,
            manual_entry,
            additions,
            selection,
        }
    }

    pub fn target(&self) -> ScanProfile {
        self.target
    }

    pub fn additions(&self) -> MutexGuard<'_, AdditionList> {
        lock(&self.additions)
    }

    pub fn selection(&self) -> Vec<SelectedProduct> {
        lock(&self.selection).clone()
    }

    fn agent(&self, profile: ScanProfile) -> Option<&ScanAgentHandle> {
        match profile {
            ScanProfile::AutoAdd => self.auto_add.as_ref(),
            ScanProfile::ManualEntry => self.manual_entry.as_ref(),
        }
    }

    fn active_agent(&self) -> anyhow::Result<&ScanAgentHandle> {
        self.agent(self.target)
            .with_context(|| format!("{} scanning is disabled", self.target))
    }

    /// Runs one command.
    pub async fn execute(&mut self, cmd: Command) -> anyhow::Result<Flow> {
        match cmd {
            Command::Fragment(text) => {
                let typed = filter::retain_accepted(&text);
                if typed.is_empty() {
                    debug!(input = %text, "Nothing left after the editing filter");
                } else {
                    self.active_agent()?.fragment(typed).await?;
                }
            }
            Command::Key(key, pending) => self.active_agent()?.terminal_key(key, pending).await?,
            Command::Change(pending) => self.active_agent()?.field_change_completed(pending).await?,
            Command::Paste(text) => self.active_agent()?.paste(text).await?,
            Command::Target(profile) => {
                if self.agent(profile).is_none() {
                    anyhow::bail!("{} scanning is disabled", profile);
                }
                if let Some(previous) = self.agent(self.target) {
                    previous.reset().await?;
                }
                self.target = profile;
                println!("scanning into {}", profile);
            }
            Command::Add(raw) => {
                let outcome = lock(&self.additions).add_manual(&self.shelf_id, &raw);
                match outcome {
                    AddOutcome::Added(_) => println!("added {}", raw.trim()),
                    AddOutcome::Duplicate(_) => println!("{} is already listed", raw.trim()),
                    AddOutcome::Rejected(_) => {}
                }
            }
            Command::Check(raw) => {
                println!("{}", serde_json::to_string(&validate(&raw))?);
            }
            Command::Import(path) => {
                let mut additions = lock(&self.additions);
                let report = import_file(&path, &self.shelf_id, &mut additions)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                println!("{}", report.summary());
            }
            Command::List => {
                let additions = lock(&self.additions);
                if additions.is_empty() {
                    println!("addition list is empty");
                }
                for (i, item) in additions.iter().enumerate() {
                    println!("{:>3}. {} ({:?})", i + 1, item.jan, item.source);
                }
            }
            Command::Remove(n) => match lock(&self.additions).remove(n - 1) {
                Some(item) => println!("removed {}", item.jan),
                None => warn!(entry = n, "No such entry in the addition list"),
            },
            Command::Clear => lock(&self.additions).clear(),
            Command::Request => {
                let request = lock(&self.additions).registration_request(&self.shelf_id);
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
            Command::Results(body) => {
                let mut additions = lock(&self.additions);
                let summary = RegistrationSummary::from_response(&body, &additions)?;
                additions.retain_failed(&summary);
                println!("{}", summary.message());
            }
            Command::Export => match selection_csv(&lock(&self.selection)) {
                Some(csv) => println!("{}", csv),
                None => println!("nothing selected"),
            },
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Commits anything still buffered and stops both agents.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        for handle in [&self.auto_add, &self.manual_entry].into_iter().flatten() {
            handle.field_change_completed("").await?;
            handle.shutdown().await?;
            handle.closed().await;
        }
        info!(
            shelf = %self.shelf_id,
            pending = self.additions().len(),
            selected = self.selection().len(),
            "Station stopped"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(
            Command::parse("4006381333931\r\n"),
            Ok(Some(Command::Fragment("4006381333931".into())))
        );
        assert_eq!(
            Command::parse(":enter 5074"),
            Ok(Some(Command::Key(TerminalKey::Enter, "5074".into())))
        );
        assert_eq!(
            Command::parse(":tab"),
            Ok(Some(Command::Key(TerminalKey::Tab, String::new())))
        );
        assert_eq!(
            Command::parse(":manual"),
            Ok(Some(Command::Target(ScanProfile::ManualEntry)))
        );
        assert_eq!(Command::parse(":remove 2"), Ok(Some(Command::Remove(2))));
        assert!(Command::parse(":remove 0").is_err());
        assert!(Command::parse(":remove two").is_err());
        assert!(Command::parse(":paste").is_err());
        assert!(Command::parse(":bogus").is_err());
        assert_eq!(Command::parse(":quit"), Ok(Some(Command::Quit)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scans_reach_both_lists() {
        let mut station = Station::start(&ScannerConfig::default(), "shelf-7");
        assert_eq!(station.target(), ScanProfile::AutoAdd);

        station.execute(Command::Fragment("96385074".into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        station.execute(Command::Target(ScanProfile::ManualEntry)).await.unwrap();
        station.execute(Command::Paste("049000028911".into())).await.unwrap();
        station.shutdown_for_test().await;

        let selection = station.selection();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].jan, "96385074");
        assert_eq!(selection[0].shelf_id, "shelf-7");

        let additions = station.additions();
        assert_eq!(additions.len(), 1);
        assert_eq!(additions.items()[0].jan.as_str(), "0049000028911");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stray_keystroke_is_filtered() {
        let mut station = Station::start(&ScannerConfig::default(), "shelf-7");

        station.execute(Command::Fragment("400638133393x1".into())).await.unwrap();
        station.execute(Command::Fragment("abc".into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        station.shutdown_for_test().await;

        let selection = station.selection();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].jan, "4006381333931");
    }

    #[tokio::test(start_paused = true)]
    async fn test_registration_round() {
        let mut station = Station::start(&ScannerConfig::default(), "A-1");
        station.execute(Command::Add("4006381333931".into())).await.unwrap();
        station.execute(Command::Add("96385074".into())).await.unwrap();
        station.execute(Command::Add("96385075".into())).await.unwrap();
        assert_eq!(station.additions().len(), 2);

        let body = r#"{"results":[
            {"jan":"4006381333931","status":"success","id":1},
            {"jan":"96385074","status":"not_found"}
        ]}"#;
        station.execute(Command::Results(body.into())).await.unwrap();

        let additions = station.additions();
        assert_eq!(additions.len(), 1);
        assert_eq!(additions.items()[0].jan.as_str(), "96385074");
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_profile() {
        let mut config = ScannerConfig::default();
        config.auto_add.enabled = false;

        let mut station = Station::start(&config, "B-2");
        assert_eq!(station.target(), ScanProfile::ManualEntry);
        assert!(station
            .execute(Command::Target(ScanProfile::AutoAdd))
            .await
            .is_err());
    }

    impl Station {
        /// Flushes both agents without consuming the station.
        async fn shutdown_for_test(&self) {
            for handle in [&self.auto_add, &self.manual_entry].into_iter().flatten() {
                handle.shutdown().await.unwrap();
                handle.closed().await;
            }
        }
    }
}
