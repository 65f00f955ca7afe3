//! Key name resolution for shortcut requests.
//!
//! Shortcut requests name their key either symbolically (`ENTER`, `F5`,
//! `DELETE`) or as a single character (`c` in CTRL+C).  Symbolic names map
//! straight to a position; single characters go through the active layout,
//! because the position that produces `z` depends on the target's layout.

pub mod hid;

pub use hid::HidKeyCode;

use crate::domain::layout::LayoutTable;

/// Resolves key names to physical positions.
pub struct KeyMapper;

impl KeyMapper {
    /// Resolves a symbolic, non-printable key name (case-insensitive).
    ///
    /// Returns `None` if `name` is not a known key name.  Single characters
    /// are not handled here; see [`KeyMapper::resolve`].
    pub fn named_key(name: &str) -> Option<HidKeyCode> {
        let upper = name.trim().to_ascii_uppercase();
        let key = match upper.as_str() {
            "ENTER" | "RETURN" => HidKeyCode::Enter,
            "ESC" | "ESCAPE" => HidKeyCode::Escape,
            "TAB" => HidKeyCode::Tab,
            "DELETE" | "DEL" => HidKeyCode::Delete,
            "BACKSPACE" => HidKeyCode::Backspace,
            "SPACE" => HidKeyCode::Space,
            "INSERT" => HidKeyCode::Insert,
            "HOME" => HidKeyCode::Home,
            "END" => HidKeyCode::End,
            "PAGEUP" => HidKeyCode::PageUp,
            "PAGEDOWN" => HidKeyCode::PageDown,
            "UP" => HidKeyCode::ArrowUp,
            "DOWN" => HidKeyCode::ArrowDown,
            "LEFT" => HidKeyCode::ArrowLeft,
            "RIGHT" => HidKeyCode::ArrowRight,
            "PRINTSCREEN" => HidKeyCode::PrintScreen,
            other => return function_key(other),
        };
        Some(key)
    }

    /// Resolves a key name to a position: symbolic names first, then a single
    /// character through `layout`.
    ///
    /// For a character only the *position* is taken; any modifier the layout
    /// would need is dropped, because the caller supplies the modifiers of a
    /// shortcut explicitly.  Letters are looked up in lower case.
    pub fn resolve(name: &str, layout: &LayoutTable) -> Option<HidKeyCode> {
        if let Some(key) = Self::named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let lower = c.to_lowercase().next().unwrap_or(c);
                layout.lookup(lower).map(|stroke| stroke.key)
            }
            _ => None,
        }
    }
}

/// `F1`–`F12`.
fn function_key(name: &str) -> Option<HidKeyCode> {
    let number = name.strip_prefix('F')?;
    if number.is_empty() {
        return None;
    }
    HidKeyCode::function_key(number.parse().ok()?)
}
