//! vision-hid-node library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the control node do?
//!
//! The node sits between an automation agent and a target computer it can
//! only see and type into.  It:
//!
//! 1. Emulates a USB keyboard through the Linux HID gadget (`/dev/hidg0`),
//!    writing one 8-byte boot report per key press and release.
//! 2. Translates characters to physical key positions through a layout table
//!    (QWERTY or QWERTZ), because the target interprets positions through its
//!    own configured layout.
//! 3. Probes the target once to find out which layout that is, by typing the
//!    `Z` position and reading back what appeared.
//! 4. Confirms every verified injection by reading the screen back, clearing
//!    the line and retrying when the text did not arrive intact.

/// Application layer: use cases and ports.
pub mod application;

/// Infrastructure layer: gadget, vision, simulation, clock and config adapters.
pub mod infrastructure;
