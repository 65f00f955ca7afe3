//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! These are the *physical position codes* carried in byte 2 of every boot
//! keyboard report written to the gadget.  A usage ID names a key location,
//! not a character: usage 0x1D is the key that a US keyboard labels `Z` and a
//! German keyboard labels `Y`.  Which character the target renders is decided
//! by the layout configured on the target, which is exactly what the layout
//! detector probes for.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! Only the usages reachable from the layout tables and the named-key table
//! are modelled.  Modifier keys are not usages here: in a boot report they are
//! carried as bits of byte 0 (see [`crate::ModifierMask`]).

use serde::{Deserialize, Serialize};

/// USB HID Usage ID for a keyboard position.
///
/// The discriminant of each variant is the byte written into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letter positions (HID 0x04–0x1D), named after the US legend.
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digit row (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation positions (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    /// ISO key left of Enter (`#'` on German boards).
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    CapsLock = 0x39,

    // Function keys (HID 0x3A–0x45), contiguous so F-n is F1 + (n - 1).
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (HID 0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    /// ISO key right of left shift (`<>|` on German boards).
    NonUsBackslash = 0x64,
}

impl HidKeyCode {
    /// Converts a raw usage byte back into a [`HidKeyCode`].
    ///
    /// Returns `None` for `0x00` (the "no key" filler of a report) and for any
    /// usage this crate does not model.
    pub fn from_u8(value: u8) -> Option<Self> {
        use HidKeyCode::*;
        let code = match value {
            0x04 => KeyA,
            0x05 => KeyB,
            0x06 => KeyC,
            0x07 => KeyD,
            0x08 => KeyE,
            0x09 => KeyF,
            0x0A => KeyG,
            0x0B => KeyH,
            0x0C => KeyI,
            0x0D => KeyJ,
            0x0E => KeyK,
            0x0F => KeyL,
            0x10 => KeyM,
            0x11 => KeyN,
            0x12 => KeyO,
            0x13 => KeyP,
            0x14 => KeyQ,
            0x15 => KeyR,
            0x16 => KeyS,
            0x17 => KeyT,
            0x18 => KeyU,
            0x19 => KeyV,
            0x1A => KeyW,
            0x1B => KeyX,
            0x1C => KeyY,
            0x1D => KeyZ,
            0x1E => Digit1,
            0x1F => Digit2,
            0x20 => Digit3,
            0x21 => Digit4,
            0x22 => Digit5,
            0x23 => Digit6,
            0x24 => Digit7,
            0x25 => Digit8,
            0x26 => Digit9,
            0x27 => Digit0,
            0x28 => Enter,
            0x29 => Escape,
            0x2A => Backspace,
            0x2B => Tab,
            0x2C => Space,
            0x2D => Minus,
            0x2E => Equal,
            0x2F => BracketLeft,
            0x30 => BracketRight,
            0x31 => Backslash,
            0x32 => NonUsHash,
            0x33 => Semicolon,
            0x34 => Quote,
            0x35 => Backquote,
            0x36 => Comma,
            0x37 => Period,
            0x38 => Slash,
            0x39 => CapsLock,
            0x3A => F1,
            0x3B => F2,
            0x3C => F3,
            0x3D => F4,
            0x3E => F5,
            0x3F => F6,
            0x40 => F7,
            0x41 => F8,
            0x42 => F9,
            0x43 => F10,
            0x44 => F11,
            0x45 => F12,
            0x46 => PrintScreen,
            0x47 => ScrollLock,
            0x48 => Pause,
            0x49 => Insert,
            0x4A => Home,
            0x4B => PageUp,
            0x4C => Delete,
            0x4D => End,
            0x4E => PageDown,
            0x4F => ArrowRight,
            0x50 => ArrowLeft,
            0x51 => ArrowDown,
            0x52 => ArrowUp,
            0x64 => NonUsBackslash,
            _ => return None,
        };
        Some(code)
    }

    /// Returns the raw usage byte written into a report.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the function key `F<n>` for `n` in `1..=12`.
    ///
    /// F1–F12 are contiguous on the usage page, so the code is computed by
    /// offset from F1 rather than looked up.
    pub fn function_key(n: u8) -> Option<Self> {
        if (1..=12).contains(&n) {
            Self::from_u8(HidKeyCode::F1.as_u8() + (n - 1))
        } else {
            None
        }
    }
}
