//! End-to-end tests: control node driving a simulated target.
//!
//! The `SimulatedTarget` renders reports through its own layout and serves
//! its screen as the vision read-back, so these tests exercise calibration,
//! typing, verification and correction exactly as they run against a real
//! gadget.  A `RecordingClock` keeps them instant.

use std::sync::Arc;
use std::time::Duration;

use vision_hid_core::LayoutCode;
use vision_hid_node::application::control_node::{ControlNode, NodeSettings, StartupLayout};
use vision_hid_node::application::detect_layout::DetectedLayout;
use vision_hid_node::application::inject_keys::{Clock, InjectionChannel};
use vision_hid_node::application::read_back::VisionSource;
use vision_hid_node::application::verify_injection::InjectionError;
use vision_hid_node::infrastructure::clock::RecordingClock;
use vision_hid_node::infrastructure::simulation::SimulatedTarget;

fn node_for(target: &Arc<SimulatedTarget>, initial: LayoutCode) -> (ControlNode, Arc<RecordingClock>) {
    let clock = Arc::new(RecordingClock::new());
    let settings = NodeSettings {
        initial_layout: initial,
        ..NodeSettings::default()
    };
    let node = ControlNode::new(
        Arc::clone(target) as Arc<dyn InjectionChannel>,
        Arc::clone(target) as Arc<dyn VisionSource>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        settings,
    );
    (node, clock)
}

// ── Calibration ───────────────────────────────────────────────────────────────

#[test]
fn test_auto_calibration_detects_qwertz_target() {
    // Arrange
    let target = Arc::new(SimulatedTarget::new(LayoutCode::De));
    let (mut node, _clock) = node_for(&target, LayoutCode::Us);

    // Act
    let active = node.calibrate(StartupLayout::Auto);

    // Assert
    assert_eq!(active, LayoutCode::De);
    assert_eq!(target.current_line(), "", "calibration must leave the line empty");
}

#[test]
fn test_auto_calibration_detects_qwerty_target() {
    let target = Arc::new(SimulatedTarget::new(LayoutCode::Us));
    let (mut node, _clock) = node_for(&target, LayoutCode::De);

    let active = node.calibrate(StartupLayout::Auto);

    assert_eq!(active, LayoutCode::Us);
    assert_eq!(target.current_line(), "");
}

#[test]
fn test_text_typed_after_calibration_starts_on_clean_line() {
    // Arrange
    let target = Arc::new(SimulatedTarget::new(LayoutCode::De));
    let (mut node, _clock) = node_for(&target, LayoutCode::Us);
    node.calibrate(StartupLayout::Auto);

    // Act
    let outcome = node.type_text("ls -la", None, true).unwrap();
    node.type_text("\n", None, false).unwrap();

    // Assert
    assert_eq!(outcome.attempts, 1);
    assert_eq!(target.screen_text(), "$ ls -la\n$ ");
}

#[test]
fn test_repeated_detection_is_stable() {
    let target = Arc::new(SimulatedTarget::new(LayoutCode::De));
    let (mut node, _clock) = node_for(&target, LayoutCode::Us);

    let first = node.detect_layout();
    let second = node.detect_layout();

    assert_eq!(first, DetectedLayout::Known(LayoutCode::De));
    assert_eq!(first, second);
}

#[test]
fn test_prompt_containing_y_biases_detection_towards_qwertz() {
    // The whole screen is read back, so a 'y' anywhere outweighs the
    // probe's 'z' on a QWERTY target.
    let target = Arc::new(SimulatedTarget::with_prompt(LayoutCode::Us, "Ready> "));
    let (mut node, _clock) = node_for(&target, LayoutCode::Us);

    assert_eq!(node.detect_layout(), DetectedLayout::Known(LayoutCode::De));
}

// ── Verified typing ───────────────────────────────────────────────────────────

#[test]
fn test_calibrated_node_types_qwertz_text_on_first_attempt() {
    // Arrange
    let target = Arc::new(SimulatedTarget::new(LayoutCode::De));
    let (mut node, _clock) = node_for(&target, LayoutCode::Us);
    node.calibrate(StartupLayout::Auto);

    // Act
    let outcome = node.type_text("echo yes@home | zcat", None, true).unwrap();

    // Assert
    assert!(outcome.verified);
    assert_eq!(outcome.attempts, 1);
    assert!(target.screen_text().contains("echo yes@home | zcat"));
    assert!(node.audit_trail().is_empty());
}

#[test]
fn test_lost_keystroke_is_corrected_and_retried() {
    // Arrange
    let target = Arc::new(SimulatedTarget::new(LayoutCode::Us));
    let (node, clock) = node_for(&target, LayoutCode::Us);
    target.drop_keystrokes(1);

    // Act
    let outcome = node.type_text("ls -la", None, true).unwrap();

    // Assert
    assert_eq!(outcome.attempts, 2);
    assert_eq!(target.screen_text(), "$ s -la^C\n$ ls -la");
    let audit = node.audit_trail();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].observed, "$ s -la");
    assert!(clock.sleeps().contains(&Duration::from_millis(500)));
}

#[test]
fn test_uncalibrated_layout_mismatch_fails_after_all_attempts() {
    // Arrange – engine assumes QWERTY, target is QWERTZ
    let target = Arc::new(SimulatedTarget::new(LayoutCode::De));
    let (mut node, _clock) = node_for(&target, LayoutCode::Us);
    node.calibrate(StartupLayout::Fixed(LayoutCode::Us));

    // Act
    let result = node.type_text("xyz", None, true);

    // Assert
    assert!(matches!(
        result,
        Err(InjectionError::VerificationFailed { attempts: 3, .. })
    ));
    assert_eq!(target.screen_text(), "$ xzy^C\n$ xzy^C\n$ xzy");
    let observed: Vec<String> = node.audit_trail().into_iter().map(|f| f.observed).collect();
    assert_eq!(observed.len(), 3);
    assert!(observed.iter().all(|o| o.ends_with("xzy")));
}

#[test]
fn test_unverified_typing_leaves_text_on_screen() {
    let target = Arc::new(SimulatedTarget::new(LayoutCode::Us));
    let (node, _clock) = node_for(&target, LayoutCode::Us);

    let outcome = node.type_text("whoami\n", Some(5), false).unwrap();

    assert!(!outcome.verified);
    assert_eq!(target.screen_text(), "$ whoami\n$ ");
}

// ── Shortcuts ─────────────────────────────────────────────────────────────────

#[test]
fn test_ctrl_c_shortcut_abandons_line_on_target() {
    let target = Arc::new(SimulatedTarget::new(LayoutCode::Us));
    let (node, _clock) = node_for(&target, LayoutCode::Us);
    node.type_text("sleep 100", None, false).unwrap();

    node.execute_shortcut(&["CTRL"], "c").unwrap();

    assert_eq!(target.current_line(), "");
    assert!(target.screen_text().starts_with("$ sleep 100^C"));
}

#[test]
fn test_shortcut_with_unknown_key_leaves_target_untouched() {
    let target = Arc::new(SimulatedTarget::new(LayoutCode::Us));
    let (node, clock) = node_for(&target, LayoutCode::Us);

    let result = node.execute_shortcut(&["CTRL"], "NOT_A_KEY");

    assert!(result.is_err());
    assert_eq!(target.screen_text(), "$ ");
    assert!(clock.sleeps().is_empty());
}
