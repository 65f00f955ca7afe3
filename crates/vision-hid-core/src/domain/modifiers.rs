//! Modifier bit-set carried in byte 0 of a boot keyboard report.
//!
//! The bit positions are fixed by the HID boot protocol:
//!
//! | Bit | Mask | Key         |
//! |-----|------|-------------|
//! | 0   | 0x01 | Left Ctrl   |
//! | 1   | 0x02 | Left Shift  |
//! | 2   | 0x04 | Left Alt    |
//! | 3   | 0x08 | Left GUI    |
//! | 4   | 0x10 | Right Ctrl  |
//! | 5   | 0x20 | Right Shift |
//! | 6   | 0x40 | Right Alt (AltGr) |
//! | 7   | 0x80 | Right GUI   |

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A combination of held modifier keys.
///
/// Only the combined value matters; the order in which bits were added is
/// not observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierMask(pub u8);

impl ModifierMask {
    pub const NONE: Self = Self(0x00);
    pub const LEFT_CTRL: Self = Self(0x01);
    pub const LEFT_SHIFT: Self = Self(0x02);
    pub const LEFT_ALT: Self = Self(0x04);
    pub const LEFT_GUI: Self = Self(0x08);
    pub const RIGHT_CTRL: Self = Self(0x10);
    pub const RIGHT_SHIFT: Self = Self(0x20);
    pub const RIGHT_ALT: Self = Self(0x40);
    pub const RIGHT_GUI: Self = Self(0x80);

    /// Right Alt under its European name.
    pub const ALT_GR: Self = Self::RIGHT_ALT;

    /// Resolves a modifier name as accepted by shortcut requests.
    ///
    /// Recognised (case-insensitive): `CTRL`, `ALT`, `SHIFT`, `GUI`, `WIN`,
    /// `RALT`/`ALTGR`.  The unqualified names select the left-hand key.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "CTRL" | "CONTROL" => Some(Self::LEFT_CTRL),
            "SHIFT" => Some(Self::LEFT_SHIFT),
            "ALT" => Some(Self::LEFT_ALT),
            "GUI" | "WIN" | "META" | "SUPER" => Some(Self::LEFT_GUI),
            "RALT" | "ALTGR" => Some(Self::RIGHT_ALT),
            _ => None,
        }
    }

    /// Raw byte for the report.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if either Ctrl bit is set.
    pub fn ctrl(self) -> bool {
        self.0 & (Self::LEFT_CTRL.0 | Self::RIGHT_CTRL.0) != 0
    }

    /// Returns `true` if either Shift bit is set.
    pub fn shift(self) -> bool {
        self.0 & (Self::LEFT_SHIFT.0 | Self::RIGHT_SHIFT.0) != 0
    }
}

impl BitOr for ModifierMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_alt_combines_to_0x05() {
        assert_eq!(ModifierMask::LEFT_CTRL | ModifierMask::LEFT_ALT, ModifierMask(0x05));
    }

    #[test]
    fn test_combination_is_order_independent() {
        let a = ModifierMask::LEFT_SHIFT | ModifierMask::RIGHT_ALT | ModifierMask::LEFT_GUI;
        let b = ModifierMask::LEFT_GUI | ModifierMask::LEFT_SHIFT | ModifierMask::RIGHT_ALT;
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(ModifierMask::from_name("ctrl"), Some(ModifierMask::LEFT_CTRL));
        assert_eq!(ModifierMask::from_name("Shift"), Some(ModifierMask::LEFT_SHIFT));
        assert_eq!(ModifierMask::from_name("RALT"), Some(ModifierMask::ALT_GR));
        assert_eq!(ModifierMask::from_name("win"), Some(ModifierMask::LEFT_GUI));
    }

    #[test]
    fn test_from_name_rejects_unknown_modifier() {
        assert_eq!(ModifierMask::from_name("HYPER"), None);
        assert_eq!(ModifierMask::from_name(""), None);
    }

    #[test]
    fn test_contains_and_side_helpers() {
        // Arrange
        let mask = ModifierMask::RIGHT_CTRL | ModifierMask::LEFT_SHIFT;

        // Assert
        assert!(mask.ctrl());
        assert!(mask.shift());
        assert!(mask.contains(ModifierMask::LEFT_SHIFT));
        assert!(!mask.contains(ModifierMask::LEFT_CTRL));
        assert!(ModifierMask::NONE.is_empty());
    }
}
