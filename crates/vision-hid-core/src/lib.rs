//! # vision-hid-core
//!
//! Shared keyboard model for Vision-HID Bridge: USB HID position codes, the
//! modifier mask, per-layout character tables and the 8-byte boot keyboard
//! report written to the HID gadget.
//!
//! This crate has no OS, device or timing dependencies; everything that
//! touches the injection channel, the vision channel or a clock lives in
//! `vision-hid-node`.
//!
//! # Architecture overview
//!
//! A physical keyboard is positional.  The byte that reaches the target says
//! "the key in row 4, column 7 was pressed", and the target's configured
//! layout decides which character that is.  To type a character the engine
//! therefore needs a belief about the target's layout:
//!
//! - **`keymap`**: [`HidKeyCode`] position codes and [`KeyMapper`] for named
//!   keys in shortcuts.
//! - **`domain`**: [`LayoutTable`] (character → [`KeyStroke`]) for each
//!   [`LayoutCode`], and the [`ModifierMask`] bit-set.
//! - **`protocol`**: [`KeyReport`], the exact bytes written per key event.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::layout::{KeyStroke, LayoutCode, LayoutError, LayoutTable};
pub use domain::modifiers::ModifierMask;
pub use keymap::hid::HidKeyCode;
pub use keymap::KeyMapper;
pub use protocol::report::{KeyReport, ReportError, REPORT_LEN};
