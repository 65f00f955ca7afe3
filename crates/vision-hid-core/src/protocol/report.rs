//! The 8-byte boot keyboard input report.
//!
//! ```text
//!  byte 0    byte 1     bytes 2..8
//! ┌────────┬──────────┬─────────────────────────────┐
//! │modifier│ reserved │ up to six pressed positions │
//! │  mask  │   (0)    │   (unused slots are 0x00)   │
//! └────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! This engine presses one key at a time, so only byte 2 is ever populated.
//! The all-zero report releases every key.

use thiserror::Error;

use crate::domain::layout::KeyStroke;
use crate::domain::modifiers::ModifierMask;
use crate::keymap::hid::HidKeyCode;

/// Size of a boot keyboard report in bytes.
pub const REPORT_LEN: usize = 8;

/// Number of simultaneous position slots in a report.
pub const KEY_SLOTS: usize = 6;

/// Error returned when decoding a report from raw bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report must be 8 bytes, got {0}")]
    InvalidLength(usize),
    #[error("reserved byte must be zero, got 0x{0:02X}")]
    ReservedByteSet(u8),
}

/// One boot keyboard report as written to the gadget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyReport([u8; REPORT_LEN]);

impl KeyReport {
    /// Report holding `modifiers` and pressing the single position `key`.
    pub fn press(modifiers: ModifierMask, key: HidKeyCode) -> Self {
        let mut bytes = [0u8; REPORT_LEN];
        bytes[0] = modifiers.bits();
        bytes[2] = key.as_u8();
        Self(bytes)
    }

    /// Report for a [`KeyStroke`].
    pub fn for_stroke(stroke: KeyStroke) -> Self {
        Self::press(stroke.modifiers, stroke.key)
    }

    /// The all-zero "release everything" report.
    pub const fn release() -> Self {
        Self([0u8; REPORT_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    pub fn modifiers(&self) -> ModifierMask {
        ModifierMask(self.0[0])
    }

    /// Raw position codes of all six slots.
    pub fn slots(&self) -> &[u8] {
        &self.0[2..]
    }

    /// The first pressed position, if any slot is populated with a known key.
    pub fn key(&self) -> Option<HidKeyCode> {
        self.slots()
            .iter()
            .find(|&&b| b != 0)
            .and_then(|&b| HidKeyCode::from_u8(b))
    }

    /// Returns `true` for the all-zero release report.
    pub fn is_release(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<KeyStroke> for KeyReport {
    fn from(stroke: KeyStroke) -> Self {
        Self::for_stroke(stroke)
    }
}

impl TryFrom<&[u8]> for KeyReport {
    type Error = ReportError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; REPORT_LEN] = bytes
            .try_into()
            .map_err(|_| ReportError::InvalidLength(bytes.len()))?;
        if bytes[1] != 0 {
            return Err(ReportError::ReservedByteSet(bytes[1]));
        }
        Ok(Self(bytes))
    }
}
