//! # Shelf Scan Station
//!
//! Console front end for the scan engine. Each stdin line is one input event
//! (see [`station`] for the command list); a HID scanner pointed at the
//! terminal works as-is.
//!
//! ```text
//! scan-station [--shelf <id>] [--config <path>] [--import <csv>]
//! ```

mod station;

use std::path::PathBuf;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shelfscan_input::ScannerConfig;

use crate::station::{Command, Flow, Station};

/// Command line arguments.
#[derive(Debug, Default)]
struct Args {
    shelf_id: Option<String>,
    config: Option<PathBuf>,
    import: Option<PathBuf>,
}

impl Args {
    fn parse(mut argv: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = Args::default();

        while let Some(flag) = argv.next() {
            let mut value = || {
                argv.next()
                    .with_context(|| format!("{} needs a value", flag))
            };
            match flag.as_str() {
                "--shelf" => args.shelf_id = Some(value()?),
                "--config" => args.config = Some(PathBuf::from(value()?)),
                "--import" => args.import = Some(PathBuf::from(value()?)),
                other => bail!("unknown argument: {}", other),
            }
        }

        Ok(args)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = ScannerConfig::load_or_default(args.config);
    let shelf_id = args.shelf_id.unwrap_or_else(|| "default".to_string());

    info!(
        shelf = %shelf_id,
        idle_ms = config.timing.idle_ms,
        max_scan_duration_ms = config.timing.max_scan_duration_ms,
        "Starting scan station"
    );

    let mut station = Station::start(&config, shelf_id);
    println!("scanning into {}", station.target());

    if let Some(path) = args.import {
        station.execute(Command::Import(path)).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match station.execute(cmd).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => warn!(error = %e, "Command failed"),
        }
    }

    station.shutdown().await
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shelfscan=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> impl Iterator<Item = String> {
        args.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse(argv(&["--shelf", "A-3", "--import", "handy.csv"])).unwrap();
        assert_eq!(args.shelf_id.as_deref(), Some("A-3"));
        assert_eq!(args.import, Some(PathBuf::from("handy.csv")));
        assert!(args.config.is_none());

        assert!(Args::parse(argv(&["--shelf"])).is_err());
        assert!(Args::parse(argv(&["--verbose"])).is_err());
    }
}
