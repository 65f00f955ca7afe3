//! LayoutDetector: closed-loop identification of the target's keyboard layout.
//!
//! # How detection works
//!
//! The detector presses the physical position that carries the legend `Z` on
//! a QWERTY keyboard, waits for the target to render it, and reads the screen
//! back.  A QWERTY target renders `z`; a QWERTZ target renders `y` because the
//! two positions are swapped there.
//!
//! The probe is always sent through the QWERTY table so the same physical key
//! is pressed whatever layout the injector currently believes in.
//!
//! # Decision rule
//!
//! | read-back (case-insensitive)      | result    |
//! |-----------------------------------|-----------|
//! | contains `y`                      | `DE`      |
//! | otherwise contains `z`            | `US`      |
//! | neither                           | `UNKNOWN` |
//!
//! The `y` check runs first, so unrelated text already on screen can bias the
//! outcome.  Detection never fails: an unreadable screen yields `UNKNOWN`.
//!
//! After the read-back the probe is erased with one BACKSPACE per probe
//! character, so text typed next does not land behind it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use vision_hid_core::{LayoutCode, LayoutTable};

use super::inject_keys::{Cadence, Clock, KeyInjector};
use super::read_back::{read_screen, VisionSource};

/// Outcome of one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLayout {
    Known(LayoutCode),
    Unknown,
}

impl DetectedLayout {
    pub fn code(self) -> Option<LayoutCode> {
        match self {
            Self::Known(code) => Some(code),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for DetectedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(code) => write!(f, "{code}"),
            Self::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionState {
    #[default]
    Undetermined,
    Detected(DetectedLayout),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    /// Character typed through the QWERTY table as the probe.
    pub probe: char,
    /// Slower than normal typing so the target cannot miss the probe.
    pub probe_cadence: Cadence,
    /// Pause between typing the probe and reading the screen.
    pub settle: Duration,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            probe: 'z',
            probe_cadence: Cadence::new(Duration::from_millis(100), Duration::from_millis(20)),
            settle: Duration::from_secs(1),
        }
    }
}

/// Classifies a read-back of the probe.
pub fn classify_read_back(text: &str) -> DetectedLayout {
    let lowered = text.to_lowercase();
    if lowered.contains('y') {
        DetectedLayout::Known(LayoutCode::De)
    } else if lowered.contains('z') {
        DetectedLayout::Known(LayoutCode::Us)
    } else {
        DetectedLayout::Unknown
    }
}

pub struct LayoutDetector {
    injector: Arc<KeyInjector>,
    vision: Arc<dyn VisionSource>,
    clock: Arc<dyn Clock>,
    settings: DetectionSettings,
    state: DetectionState,
}

impl LayoutDetector {
    pub fn new(
        injector: Arc<KeyInjector>,
        vision: Arc<dyn VisionSource>,
        clock: Arc<dyn Clock>,
        settings: DetectionSettings,
    ) -> Self {
        Self {
            injector,
            vision,
            clock,
            settings,
            state: DetectionState::Undetermined,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Types the probe, waits, reads the screen and classifies the result.
    ///
    /// Does not change the active layout; see [`LayoutDetector::apply_layout`].
    pub fn detect(&mut self) -> DetectedLayout {
        info!(probe = ?self.settings.probe, "starting keyboard layout detection");

        let probe = self.settings.probe.to_string();
        self.injector
            .type_text_on(LayoutTable::us(), &probe, self.settings.probe_cadence);
        self.clock.sleep(self.settings.settle);

        let observed = read_screen(self.vision.as_ref());
        self.erase_probe(probe.chars().count());
        let detected = classify_read_back(&observed);
        self.state = DetectionState::Detected(detected);

        info!(observed = %observed.trim(), layout = %detected, "layout detection finished");
        detected
    }

    fn erase_probe(&self, count: usize) {
        for _ in 0..count {
            if let Err(e) = self.injector.press_sequence::<&str>(&[], "BACKSPACE") {
                warn!("could not erase layout probe: {e}");
                return;
            }
        }
    }

    /// Switches the injector to `detected`; an unknown result keeps the
    /// current table.  Returns the layout now active.
    pub fn apply_layout(&self, detected: DetectedLayout) -> LayoutCode {
        match detected {
            DetectedLayout::Known(code) => self.injector.set_layout(code),
            DetectedLayout::Unknown => {
                warn!(
                    current = %self.injector.layout_code(),
                    "layout could not be determined; keeping current layout"
                );
            }
        }
        self.injector.layout_code()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inject_keys::{InjectionChannel, TypingSettings};
    use crate::application::read_back::VisionError;
    use crate::infrastructure::clock::RecordingClock;
    use crate::infrastructure::hid_gadget::mock::RecordingChannel;
    use crate::infrastructure::vision::mock::ScriptedVision;
    use vision_hid_core::HidKeyCode;

    struct Fixture {
        detector: LayoutDetector,
        injector: Arc<KeyInjector>,
        channel: Arc<RecordingChannel>,
        clock: Arc<RecordingClock>,
    }

    fn make_detector(vision: Arc<dyn VisionSource>, active: LayoutCode) -> Fixture {
        let channel = Arc::new(RecordingChannel::new());
        let clock = Arc::new(RecordingClock::new());
        let injector = Arc::new(KeyInjector::new(
            Arc::clone(&channel) as Arc<dyn InjectionChannel>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            active,
            TypingSettings::default(),
        ));
        let detector = LayoutDetector::new(
            Arc::clone(&injector),
            vision,
            Arc::clone(&clock) as Arc<dyn Clock>,
            DetectionSettings::default(),
        );
        Fixture {
            detector,
            injector,
            channel,
            clock,
        }
    }

    // ── classify_read_back ────────────────────────────────────────────────────

    #[test]
    fn test_classify_y_means_qwertz() {
        assert_eq!(classify_read_back("y"), DetectedLayout::Known(LayoutCode::De));
        assert_eq!(classify_read_back("  Y \n"), DetectedLayout::Known(LayoutCode::De));
    }

    #[test]
    fn test_classify_z_means_qwerty() {
        assert_eq!(classify_read_back("$ z"), DetectedLayout::Known(LayoutCode::Us));
    }

    #[test]
    fn test_classify_neither_letter_is_unknown() {
        assert_eq!(classify_read_back(""), DetectedLayout::Unknown);
        assert_eq!(classify_read_back("C:\\>"), DetectedLayout::Unknown);
    }

    #[test]
    fn test_classify_both_letters_prefers_qwertz() {
        // Known ambiguity: stray text such as "Ready" on a QWERTY screen
        // contains a 'y' and wins over the probe's 'z'.
        assert_eq!(classify_read_back("Ready> z"), DetectedLayout::Known(LayoutCode::De));
    }

    #[test]
    fn test_detected_layout_display() {
        assert_eq!(DetectedLayout::Known(LayoutCode::Us).to_string(), "US");
        assert_eq!(DetectedLayout::Known(LayoutCode::De).to_string(), "DE");
        assert_eq!(DetectedLayout::Unknown.to_string(), "UNKNOWN");
    }

    // ── detect ────────────────────────────────────────────────────────────────

    #[test]
    fn test_detect_types_probe_at_qwerty_z_position() {
        // Arrange – the injector currently believes in QWERTZ
        let mut fx = make_detector(Arc::new(ScriptedVision::new(["y"])), LayoutCode::De);

        // Act
        let detected = fx.detector.detect();

        // Assert
        assert_eq!(detected, DetectedLayout::Known(LayoutCode::De));
        let presses = fx.channel.presses();
        assert_eq!(presses[0].key(), Some(HidKeyCode::KeyZ));
        assert!(presses[0].modifiers().is_empty());
    }

    #[test]
    fn test_detect_erases_probe_after_read_back() {
        // Arrange
        let vision = Arc::new(ScriptedVision::new(["z"]));
        let mut fx = make_detector(Arc::clone(&vision) as Arc<dyn VisionSource>, LayoutCode::Us);

        // Act
        fx.detector.detect();

        // Assert – probe, then exactly one BACKSPACE
        let keys: Vec<_> = fx.channel.presses().iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec![Some(HidKeyCode::KeyZ), Some(HidKeyCode::Backspace)]);
        assert_eq!(vision.call_count(), 1);
    }

    #[test]
    fn test_detect_waits_settle_time_before_reading() {
        let mut fx = make_detector(Arc::new(ScriptedVision::new(["z"])), LayoutCode::Us);

        fx.detector.detect();

        assert!(fx.clock.sleeps().contains(&Duration::from_secs(1)));
        assert!(fx.clock.total() >= Duration::from_secs(1));
    }

    #[test]
    fn test_detect_records_state() {
        let mut fx = make_detector(Arc::new(ScriptedVision::new(["z"])), LayoutCode::Us);
        assert_eq!(fx.detector.state(), DetectionState::Undetermined);

        fx.detector.detect();

        assert_eq!(
            fx.detector.state(),
            DetectionState::Detected(DetectedLayout::Known(LayoutCode::Us))
        );
    }

    #[test]
    fn test_detect_is_idempotent_for_stable_read_back() {
        let mut fx = make_detector(Arc::new(ScriptedVision::new(["y"])), LayoutCode::Us);
        let first = fx.detector.detect();
        let second = fx.detector.detect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_detect_vision_failure_yields_unknown() {
        struct BrokenVision;
        impl VisionSource for BrokenVision {
            fn capture_text(&self) -> Result<String, VisionError> {
                Err(VisionError::Unavailable("no frames".to_string()))
            }
        }

        let mut fx = make_detector(Arc::new(BrokenVision), LayoutCode::Us);
        assert_eq!(fx.detector.detect(), DetectedLayout::Unknown);
    }

    // ── apply_layout ──────────────────────────────────────────────────────────

    #[test]
    fn test_apply_known_layout_switches_injector() {
        let fx = make_detector(Arc::new(ScriptedVision::new([""])), LayoutCode::Us);

        let active = fx.detector.apply_layout(DetectedLayout::Known(LayoutCode::De));

        assert_eq!(active, LayoutCode::De);
        assert_eq!(fx.injector.layout_code(), LayoutCode::De);
    }

    #[test]
    fn test_apply_unknown_keeps_current_table() {
        let fx = make_detector(Arc::new(ScriptedVision::new([""])), LayoutCode::De);

        let active = fx.detector.apply_layout(DetectedLayout::Unknown);

        assert_eq!(active, LayoutCode::De);
        assert_eq!(fx.injector.layout_code(), LayoutCode::De);
    }
}
