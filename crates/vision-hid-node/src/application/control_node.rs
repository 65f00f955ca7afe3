//! ControlNode: one owned context for a single target machine.
//!
//! Wires the injector, detector and orchestrator to shared channels and
//! exposes the operations a front end (the CLI, or a future RPC surface)
//! calls.  Nothing here is global; two nodes driving two gadgets can live in
//! the same process.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use vision_hid_core::{LayoutCode, LayoutError};

use super::audit::VerificationFailure;
use super::detect_layout::{DetectedLayout, DetectionSettings, DetectionState, LayoutDetector};
use super::inject_keys::{Cadence, Clock, InjectionChannel, KeyInjector, TypingSettings};
use super::read_back::VisionSource;
use super::verify_injection::{InjectionError, InjectionOrchestrator, InjectionOutcome, VerifySettings};

/// Layout choice at startup: probe the target, or trust a fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StartupLayout {
    Auto,
    Fixed(LayoutCode),
}

impl FromStr for StartupLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Fixed)
        }
    }
}

impl TryFrom<String> for StartupLayout {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StartupLayout> for String {
    fn from(value: StartupLayout) -> Self {
        value.to_string()
    }
}

impl fmt::Display for StartupLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(code) => write!(f, "{code}"),
        }
    }
}

/// Everything a [`ControlNode`] needs besides its channels.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSettings {
    /// Table used until calibration says otherwise.
    pub initial_layout: LayoutCode,
    /// Cadence for `type_text` calls that do not pass a delay.
    pub default_cadence: Cadence,
    pub typing: TypingSettings,
    pub detection: DetectionSettings,
    pub verify: VerifySettings,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            initial_layout: LayoutCode::Us,
            default_cadence: Cadence::from_delay_ms(20),
            typing: TypingSettings::default(),
            detection: DetectionSettings::default(),
            verify: VerifySettings::default(),
        }
    }
}

pub struct ControlNode {
    injector: Arc<KeyInjector>,
    detector: LayoutDetector,
    orchestrator: InjectionOrchestrator,
    default_cadence: Cadence,
}

impl ControlNode {
    pub fn new(
        channel: Arc<dyn InjectionChannel>,
        vision: Arc<dyn VisionSource>,
        clock: Arc<dyn Clock>,
        settings: NodeSettings,
    ) -> Self {
        let injector = Arc::new(KeyInjector::new(
            channel,
            Arc::clone(&clock),
            settings.initial_layout,
            settings.typing,
        ));
        let detector = LayoutDetector::new(
            Arc::clone(&injector),
            Arc::clone(&vision),
            Arc::clone(&clock),
            settings.detection,
        );
        let orchestrator =
            InjectionOrchestrator::new(Arc::clone(&injector), vision, clock, settings.verify);
        Self {
            injector,
            detector,
            orchestrator,
            default_cadence: settings.default_cadence,
        }
    }

    /// Settles the active layout before the first injection.
    ///
    /// `Auto` runs one detection and applies it; a fixed layout is applied
    /// without touching the target.  Returns the active layout.
    pub fn calibrate(&mut self, startup: StartupLayout) -> LayoutCode {
        let active = match startup {
            StartupLayout::Auto => {
                let detected = self.detector.detect();
                self.detector.apply_layout(detected)
            }
            StartupLayout::Fixed(code) => {
                self.injector.set_layout(code);
                code
            }
        };
        info!(layout = %active, simulated = self.is_simulated(), "control node ready");
        active
    }

    /// Types `text`; `delay_ms` overrides the default mean inter-key delay.
    pub fn type_text(
        &self,
        text: &str,
        delay_ms: Option<u64>,
        verify: bool,
    ) -> Result<InjectionOutcome, InjectionError> {
        let cadence = delay_ms.map_or(self.default_cadence, Cadence::from_delay_ms);
        self.orchestrator.inject_verified(text, cadence, verify)
    }

    pub fn execute_shortcut<S: AsRef<str>>(
        &self,
        modifiers: &[S],
        key: &str,
    ) -> Result<(), InjectionError> {
        self.orchestrator.execute_shortcut(modifiers, key)
    }

    pub fn detect_layout(&mut self) -> DetectedLayout {
        self.detector.detect()
    }

    pub fn apply_layout(&self, detected: DetectedLayout) -> LayoutCode {
        self.detector.apply_layout(detected)
    }

    pub fn detection_state(&self) -> DetectionState {
        self.detector.state()
    }

    pub fn active_layout(&self) -> LayoutCode {
        self.injector.layout_code()
    }

    pub fn is_simulated(&self) -> bool {
        self.injector.is_simulated()
    }

    pub fn audit_trail(&self) -> Vec<VerificationFailure> {
        self.orchestrator.audit_trail()
    }
}
