//! TOML configuration for the control node.
//!
//! Read from `--config <PATH>` or, by default, from
//! `$XDG_CONFIG_HOME/vision-hid-bridge/config.toml`
//! (`~/.config/vision-hid-bridge/config.toml`).  A missing file means "all
//! defaults"; every field may be omitted.
//!
//! ```toml
//! log_level = "info"
//!
//! [channel]
//! device_path = "/dev/hidg0"
//!
//! [layout]
//! startup = "auto"          # or "US" / "DE"
//!
//! [typing]
//! mean_delay_ms = 20
//! std_delay_ms = 6
//! hold_min_ms = 10
//! hold_max_ms = 30
//! shortcut_hold_ms = 100
//!
//! [detection]
//! probe_delay_ms = 100
//! settle_ms = 1000
//!
//! [verify]
//! max_attempts = 3
//! settle_ms = 1000
//! cooldown_ms = 500
//! corrective = "clear_line" # or "escape" / "none"
//!
//! [vision]
//! command = ["/usr/local/bin/screen-ocr", "--plain"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vision_hid_core::LayoutCode;

use crate::application::control_node::{NodeSettings, StartupLayout};
use crate::application::detect_layout::DetectionSettings;
use crate::application::inject_keys::{Cadence, TypingSettings};
use crate::application::verify_injection::{CorrectiveAction, VerifySettings};
use crate::infrastructure::hid_gadget::DEFAULT_DEVICE_PATH;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub vision: VisionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    #[serde(default = "default_device_path")]
    pub device_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default = "default_startup_layout")]
    pub startup: StartupLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypingConfig {
    #[serde(default = "default_mean_delay_ms")]
    pub mean_delay_ms: u64,
    #[serde(default = "default_std_delay_ms")]
    pub std_delay_ms: u64,
    #[serde(default = "default_hold_min_ms")]
    pub hold_min_ms: u64,
    #[serde(default = "default_hold_max_ms")]
    pub hold_max_ms: u64,
    #[serde(default = "default_shortcut_hold_ms")]
    pub shortcut_hold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub corrective: CorrectiveAction,
}

/// External OCR command; empty means no vision channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisionConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_device_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE_PATH)
}
fn default_startup_layout() -> StartupLayout {
    StartupLayout::Auto
}
fn default_mean_delay_ms() -> u64 {
    20
}
fn default_std_delay_ms() -> u64 {
    6
}
fn default_hold_min_ms() -> u64 {
    10
}
fn default_hold_max_ms() -> u64 {
    30
}
fn default_shortcut_hold_ms() -> u64 {
    100
}
fn default_probe_delay_ms() -> u64 {
    100
}
fn default_settle_ms() -> u64 {
    1000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_cooldown_ms() -> u64 {
    500
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            channel: ChannelConfig::default(),
            layout: LayoutConfig::default(),
            typing: TypingConfig::default(),
            detection: DetectionConfig::default(),
            verify: VerifyConfig::default(),
            vision: VisionConfig::default(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            device_path: default_device_path(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            startup: default_startup_layout(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            mean_delay_ms: default_mean_delay_ms(),
            std_delay_ms: default_std_delay_ms(),
            hold_min_ms: default_hold_min_ms(),
            hold_max_ms: default_hold_max_ms(),
            shortcut_hold_ms: default_shortcut_hold_ms(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            probe_delay_ms: default_probe_delay_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            settle_ms: default_settle_ms(),
            cooldown_ms: default_cooldown_ms(),
            corrective: CorrectiveAction::default(),
        }
    }
}

impl NodeConfig {
    /// Rejects values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verify.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "verify.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.typing.hold_min_ms > self.typing.hold_max_ms {
            return Err(ConfigError::Invalid(format!(
                "typing.hold_min_ms ({}) exceeds typing.hold_max_ms ({})",
                self.typing.hold_min_ms, self.typing.hold_max_ms
            )));
        }
        Ok(())
    }

    /// Engine settings derived from this file.
    ///
    /// The initial table is the fixed startup layout, or QWERTY when the
    /// layout is to be detected.
    pub fn node_settings(&self) -> NodeSettings {
        let initial_layout = match self.layout.startup {
            StartupLayout::Fixed(code) => code,
            StartupLayout::Auto => LayoutCode::Us,
        };
        let probe_mean = Duration::from_millis(self.detection.probe_delay_ms);
        NodeSettings {
            initial_layout,
            default_cadence: Cadence::new(
                Duration::from_millis(self.typing.mean_delay_ms),
                Duration::from_millis(self.typing.std_delay_ms),
            ),
            typing: TypingSettings {
                hold_min: Duration::from_millis(self.typing.hold_min_ms),
                hold_max: Duration::from_millis(self.typing.hold_max_ms),
                shortcut_hold: Duration::from_millis(self.typing.shortcut_hold_ms),
            },
            detection: DetectionSettings {
                probe_cadence: Cadence::new(probe_mean, probe_mean / 5),
                settle: Duration::from_millis(self.detection.settle_ms),
                ..DetectionSettings::default()
            },
            verify: VerifySettings {
                max_attempts: self.verify.max_attempts,
                settle: Duration::from_millis(self.verify.settle_ms),
                cooldown: Duration::from_millis(self.verify.cooldown_ms),
                corrective: self.verify.corrective,
            },
        }
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

/// Default location of the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("vision-hid-bridge").join("config.toml"))
}

/// Loads and validates the config at `path`, returning defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] for
/// values that fail validation.
pub fn load_config_from(path: &Path) -> Result<NodeConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<NodeConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => NodeConfig::default(),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Writes `config` to `path`, creating parent directories.
pub fn save_config_to(path: &Path, config: &NodeConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.channel.device_path, PathBuf::from("/dev/hidg0"));
        assert_eq!(cfg.layout.startup, StartupLayout::Auto);
        assert_eq!(cfg.verify.max_attempts, 3);
        assert_eq!(cfg.verify.corrective, CorrectiveAction::ClearLine);
        assert!(cfg.vision.command.is_empty());
    }

    #[test]
    fn test_default_node_settings_timing() {
        let settings = NodeConfig::default().node_settings();
        assert_eq!(settings.initial_layout, LayoutCode::Us);
        assert_eq!(settings.typing.hold_min, Duration::from_millis(10));
        assert_eq!(settings.typing.hold_max, Duration::from_millis(30));
        assert_eq!(settings.typing.shortcut_hold, Duration::from_millis(100));
        assert_eq!(settings.detection.probe_cadence.mean, Duration::from_millis(100));
        assert_eq!(settings.detection.settle, Duration::from_secs(1));
        assert_eq!(settings.verify.settle, Duration::from_secs(1));
        assert_eq!(settings.verify.cooldown, Duration::from_millis(500));
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let cfg: NodeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, NodeConfig::default());
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        // Arrange
        let toml_str = r#"
            [layout]
            startup = "DE"

            [verify]
            max_attempts = 5
            corrective = "escape"

            [vision]
            command = ["ocr", "--plain"]
        "#;

        // Act
        let cfg: NodeConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.layout.startup, StartupLayout::Fixed(LayoutCode::De));
        assert_eq!(cfg.verify.max_attempts, 5);
        assert_eq!(cfg.verify.settle_ms, 1000);
        assert_eq!(cfg.verify.corrective, CorrectiveAction::Escape);
        assert_eq!(cfg.vision.command, vec!["ocr", "--plain"]);
        assert_eq!(cfg.node_settings().initial_layout, LayoutCode::De);
    }

    #[test]
    fn test_unknown_startup_layout_is_parse_error() {
        let result = toml::from_str::<NodeConfig>("[layout]\nstartup = \"dvorak\"");
        assert!(result.is_err());
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_zero_attempts_is_invalid() {
        let mut cfg = NodeConfig::default();
        cfg.verify.max_attempts = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inverted_hold_range_is_invalid() {
        let mut cfg = NodeConfig::default();
        cfg.typing.hold_min_ms = 50;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("hold_min_ms"));
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg, NodeConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip_via_temp_dir() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = NodeConfig::default();
        cfg.layout.startup = StartupLayout::Fixed(LayoutCode::De);
        cfg.typing.mean_delay_ms = 45;

        // Act
        save_config_to(&path, &cfg).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[verify]\nmax_attempts = 0\n").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[verify\nmax_attempts = ").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("vision-hid-bridge/config.toml"));
        }
    }
}
