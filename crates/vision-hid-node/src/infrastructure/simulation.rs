//! SimulatedTarget: an in-memory target machine.
//!
//! Implements both ends of the loop.  As an [`InjectionChannel`] it receives
//! boot keyboard reports and renders them through its *own* layout, the way a
//! real host would; as a [`VisionSource`] it returns the rendered screen
//! buffer.  Running the engine with one layout against a target with the
//! other reproduces the Y/Z mismatch that calibration exists to fix.
//!
//! Rendering rules:
//!
//! - a stroke the target layout maps to a character appends it;
//! - ENTER starts a new line with the prompt;
//! - BACKSPACE deletes the last character typed on the current line;
//! - CTRL+C abandons the current line (it is replaced with a fresh prompt);
//! - anything else is ignored.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::trace;

use vision_hid_core::{HidKeyCode, KeyReport, KeyStroke, LayoutCode, LayoutTable};

use crate::application::inject_keys::{ChannelError, InjectionChannel};
use crate::application::read_back::{VisionError, VisionSource};

pub const DEFAULT_PROMPT: &str = "$ ";

/// Completed lines kept on screen; older ones scroll off.
pub const MAX_HISTORY_LINES: usize = 50;

struct Screen {
    /// Completed lines, oldest first.
    history: VecDeque<String>,
    /// Text typed after the prompt on the current line.
    current: String,
    /// Printable keystrokes still to be swallowed.
    drop_next: usize,
}

impl Screen {
    fn push_line(&mut self, line: String) {
        if self.history.len() == MAX_HISTORY_LINES {
            self.history.pop_front();
        }
        self.history.push_back(line);
    }
}

pub struct SimulatedTarget {
    layout: &'static LayoutTable,
    prompt: String,
    screen: Mutex<Screen>,
}

impl SimulatedTarget {
    pub fn new(layout: LayoutCode) -> Self {
        Self::with_prompt(layout, DEFAULT_PROMPT)
    }

    pub fn with_prompt(layout: LayoutCode, prompt: &str) -> Self {
        Self {
            layout: layout.table(),
            prompt: prompt.to_string(),
            screen: Mutex::new(Screen {
                history: VecDeque::with_capacity(MAX_HISTORY_LINES),
                current: String::new(),
                drop_next: 0,
            }),
        }
    }

    pub fn layout(&self) -> LayoutCode {
        self.layout.code()
    }

    /// Loses the next `count` printable keystrokes, as a flaky link would.
    pub fn drop_keystrokes(&self, count: usize) {
        self.screen.lock().drop_next = count;
    }

    /// Whole screen: completed lines followed by the current prompt line.
    pub fn screen_text(&self) -> String {
        let screen = self.screen.lock();
        let mut text = String::new();
        for line in &screen.history {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&self.prompt);
        text.push_str(&screen.current);
        text
    }

    /// Text typed on the current line, without the prompt.
    pub fn current_line(&self) -> String {
        self.screen.lock().current.clone()
    }

    fn render(&self, report: &KeyReport) {
        let Some(key) = report.key() else {
            return;
        };
        let modifiers = report.modifiers();
        let mut screen = self.screen.lock();

        if modifiers.ctrl() {
            if key == HidKeyCode::KeyC {
                let abandoned = format!("{}{}^C", self.prompt, screen.current);
                screen.push_line(abandoned);
                screen.current.clear();
            }
            return;
        }

        match key {
            HidKeyCode::Enter => {
                let line = format!("{}{}", self.prompt, screen.current);
                screen.push_line(line);
                screen.current.clear();
            }
            HidKeyCode::Backspace => {
                screen.current.pop();
            }
            _ => match self.layout.char_for(KeyStroke::new(modifiers, key)) {
                Some(_) if screen.drop_next > 0 => {
                    screen.drop_next -= 1;
                    trace!(?key, "simulated target dropped keystroke");
                }
                Some(c) => screen.current.push(c),
                None => trace!(?key, %modifiers, "simulated target ignored stroke"),
            },
        }
    }
}

impl InjectionChannel for SimulatedTarget {
    fn write_report(&self, report: &KeyReport) -> Result<(), ChannelError> {
        if !report.is_release() {
            self.render(report);
        }
        Ok(())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

impl VisionSource for SimulatedTarget {
    fn capture_text(&self) -> Result<String, VisionError> {
        Ok(self.screen_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_hid_core::ModifierMask;

    fn press(target: &SimulatedTarget, modifiers: ModifierMask, key: HidKeyCode) {
        target.write_report(&KeyReport::press(modifiers, key)).unwrap();
        target.write_report(&KeyReport::release()).unwrap();
    }

    #[test]
    fn test_qwertz_target_renders_qwerty_z_position_as_y() {
        let target = SimulatedTarget::new(LayoutCode::De);

        press(&target, ModifierMask::NONE, HidKeyCode::KeyZ);

        assert_eq!(target.current_line(), "y");
    }

    #[test]
    fn test_altgr_symbol_renders_on_qwertz() {
        let target = SimulatedTarget::new(LayoutCode::De);

        press(&target, ModifierMask::ALT_GR, HidKeyCode::KeyQ);

        assert_eq!(target.current_line(), "@");
    }

    #[test]
    fn test_enter_and_ctrl_c_start_new_lines() {
        // Arrange
        let target = SimulatedTarget::new(LayoutCode::Us);
        press(&target, ModifierMask::NONE, HidKeyCode::KeyL);
        press(&target, ModifierMask::NONE, HidKeyCode::Enter);
        press(&target, ModifierMask::NONE, HidKeyCode::KeyX);

        // Act
        press(&target, ModifierMask::LEFT_CTRL, HidKeyCode::KeyC);

        // Assert
        assert_eq!(target.screen_text(), "$ l\n$ x^C\n$ ");
        assert_eq!(target.current_line(), "");
    }

    #[test]
    fn test_backspace_deletes_last_character() {
        let target = SimulatedTarget::new(LayoutCode::Us);
        press(&target, ModifierMask::NONE, HidKeyCode::KeyA);
        press(&target, ModifierMask::NONE, HidKeyCode::KeyB);

        press(&target, ModifierMask::NONE, HidKeyCode::Backspace);

        assert_eq!(target.current_line(), "a");
    }

    #[test]
    fn test_dropped_keystrokes_are_lost() {
        let target = SimulatedTarget::new(LayoutCode::Us);
        target.drop_keystrokes(1);

        press(&target, ModifierMask::NONE, HidKeyCode::KeyA);
        press(&target, ModifierMask::NONE, HidKeyCode::KeyB);

        assert_eq!(target.current_line(), "b");
    }

    #[test]
    fn test_history_keeps_only_most_recent_lines() {
        // Arrange
        let target = SimulatedTarget::new(LayoutCode::Us);
        press(&target, ModifierMask::NONE, HidKeyCode::KeyA);
        press(&target, ModifierMask::NONE, HidKeyCode::Enter);

        // Act
        for _ in 0..MAX_HISTORY_LINES {
            press(&target, ModifierMask::NONE, HidKeyCode::KeyB);
            press(&target, ModifierMask::LEFT_CTRL, HidKeyCode::KeyC);
        }

        // Assert
        let screen = target.screen_text();
        assert_eq!(screen.lines().count(), MAX_HISTORY_LINES + 1);
        assert!(!screen.contains("$ a"));
        assert!(screen.starts_with("$ b^C\n"));
    }

    #[test]
    fn test_capture_text_returns_screen() {
        let target = SimulatedTarget::with_prompt(LayoutCode::Us, "C:\\> ");
        press(&target, ModifierMask::LEFT_SHIFT, HidKeyCode::KeyA);
        assert_eq!(target.capture_text().unwrap(), "C:\\> A");
        assert!(target.is_simulated());
    }
}
