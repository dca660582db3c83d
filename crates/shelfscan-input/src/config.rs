//! # Scanner Configuration
//!
//! Timing windows and per-profile validator settings for the scan agents.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHELFSCAN_IDLE_MS=150                                              │
//! │     SHELFSCAN_AUTO_ADD_POLICY=strict                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/station/scanner.toml (Linux)                             │
//! │     ~/Library/Application Support/com.shelfscan.station/scanner.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     120 ms idle, 2000 ms max scan, strict auto-add, padded manual      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [timing]
//! idle_ms = 120
//! max_scan_duration_ms = 2000
//!
//! [auto_add]
//! enabled = true
//! length_policy = "strict"
//!
//! [manual_entry]
//! enabled = true
//! length_policy = "pad_to_ean13"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use shelfscan_core::LengthPolicy;

use crate::aggregator::{AggregatorConfig, DEFAULT_IDLE_MS, DEFAULT_MAX_SCAN_DURATION_MS};
use crate::error::{ScannerError, ScannerResult};

// =============================================================================
// Scan Profile
// =============================================================================

/// The two places a scanner feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanProfile {
    /// Map view: committed codes are added to the selected shelf directly.
    AutoAdd,
    /// Registration modal: committed codes land in the addition list.
    ManualEntry,
}

impl std::fmt::Display for ScanProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanProfile::AutoAdd => write!(f, "auto_add"),
            ScanProfile::ManualEntry => write!(f, "manual_entry"),
        }
    }
}

impl ScanProfile {
    /// Validator variant used when the profile section does not name one.
    pub fn default_policy(&self) -> LengthPolicy {
        match self {
            ScanProfile::AutoAdd => LengthPolicy::Strict,
            ScanProfile::ManualEntry => LengthPolicy::PadToEan13,
        }
    }
}

// =============================================================================
// Timing Settings
// =============================================================================

/// Scan timing windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Idle window that completes a scan, in milliseconds.
    #[serde(default = "default_idle_ms")]
    pub idle_ms: u64,

    /// Longest scan that may commit on idle, in milliseconds.
    #[serde(default = "default_max_scan_duration_ms")]
    pub max_scan_duration_ms: u64,
}

fn default_idle_ms() -> u64 {
    DEFAULT_IDLE_MS
}

fn default_max_scan_duration_ms() -> u64 {
    DEFAULT_MAX_SCAN_DURATION_MS
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            idle_ms: default_idle_ms(),
            max_scan_duration_ms: default_max_scan_duration_ms(),
        }
    }
}

// =============================================================================
// Profile Settings
// =============================================================================

/// Settings for one scan profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Whether an agent is started for this profile.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Validator variant; `None` means the profile's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_policy: Option<LengthPolicy>,
}

fn default_true() -> bool {
    true
}

fn default_auto_add() -> ProfileSettings {
    ProfileSettings {
        enabled: true,
        length_policy: Some(ScanProfile::AutoAdd.default_policy()),
    }
}

fn default_manual_entry() -> ProfileSettings {
    ProfileSettings {
        enabled: true,
        length_policy: Some(ScanProfile::ManualEntry.default_policy()),
    }
}

// =============================================================================
// Scanner Config
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub timing: TimingSettings,

    #[serde(default = "default_auto_add")]
    pub auto_add: ProfileSettings,

    #[serde(default = "default_manual_entry")]
    pub manual_entry: ProfileSettings,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            timing: TimingSettings::default(),
            auto_add: default_auto_add(),
            manual_entry: default_manual_entry(),
        }
    }
}

impl ScannerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ScannerResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ScannerResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ScannerError::ConfigSaveFailed("No config path available".into()))?;

        // `From<io::Error>` reports a load failure; I/O here is a save failure.
        let save_failed = |e: std::io::Error| ScannerError::ConfigSaveFailed(e.to_string());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(save_failed)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(save_failed)?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ScannerResult<()> {
        if self.timing.idle_ms == 0 {
            return Err(ScannerError::InvalidConfig(
                "idle_ms must be greater than 0".into(),
            ));
        }

        if self.timing.max_scan_duration_ms < self.timing.idle_ms {
            return Err(ScannerError::InvalidConfig(format!(
                "max_scan_duration_ms ({}) must not be shorter than idle_ms ({})",
                self.timing.max_scan_duration_ms, self.timing.idle_ms
            )));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// [`load`](Self::load)).
    pub fn apply_overrides<L>(&mut self, lookup: L)
    where
        L: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SHELFSCAN_IDLE_MS") {
            match value.parse::<u64>() {
                Ok(ms) => {
                    debug!(idle_ms = ms, "Overriding idle window from environment");
                    self.timing.idle_ms = ms;
                }
                Err(_) => warn!(value = %value, "Ignoring non-numeric SHELFSCAN_IDLE_MS"),
            }
        }

        if let Some(value) = lookup("SHELFSCAN_MAX_SCAN_MS") {
            match value.parse::<u64>() {
                Ok(ms) => {
                    debug!(max_scan_duration_ms = ms, "Overriding max scan duration from environment");
                    self.timing.max_scan_duration_ms = ms;
                }
                Err(_) => warn!(value = %value, "Ignoring non-numeric SHELFSCAN_MAX_SCAN_MS"),
            }
        }

        if let Some(value) = lookup("SHELFSCAN_AUTO_ADD_POLICY") {
            match value.parse() {
                Ok(policy) => self.auto_add.length_policy = Some(policy),
                Err(e) => warn!(error = %e, "Ignoring SHELFSCAN_AUTO_ADD_POLICY"),
            }
        }

        if let Some(value) = lookup("SHELFSCAN_MANUAL_POLICY") {
            match value.parse() {
                Ok(policy) => self.manual_entry.length_policy = Some(policy),
                Err(e) => warn!(error = %e, "Ignoring SHELFSCAN_MANUAL_POLICY"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shelfscan", "station")
            .map(|dirs| dirs.config_dir().join("scanner.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Settings for `profile`.
    pub fn profile(&self, profile: ScanProfile) -> &ProfileSettings {
        match profile {
            ScanProfile::AutoAdd => &self.auto_add,
            ScanProfile::ManualEntry => &self.manual_entry,
        }
    }

    /// Effective validator variant for `profile`.
    pub fn length_policy(&self, profile: ScanProfile) -> LengthPolicy {
        self.profile(profile)
            .length_policy
            .unwrap_or_else(|| profile.default_policy())
    }

    /// Aggregator configuration for `profile`.
    pub fn aggregator_config(&self, profile: ScanProfile) -> AggregatorConfig {
        AggregatorConfig {
            idle_timeout: Duration::from_millis(self.timing.idle_ms),
            max_scan_duration: Duration::from_millis(self.timing.max_scan_duration_ms),
            length_policy: self.length_policy(profile),
        }
    }
}
