//! Infrastructure layer for the control node.
//!
//! Adapters behind the application ports.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vision_hid_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.
//!
//! # Sub-modules
//!
//! - **`hid_gadget`** – `HidGadgetChannel` writing reports to `/dev/hidg0`,
//!   with simulation mode when the node is missing.  A `RecordingChannel` is
//!   provided for tests.
//! - **`vision`** – `CommandVision` running an external OCR command, and
//!   `UnavailableVision` when none is configured.
//! - **`simulation`** – `SimulatedTarget`, an in-memory target machine that is
//!   both an injection channel and a vision source.
//! - **`clock`** – `SystemClock` and the test `RecordingClock`.
//! - **`storage`** – the TOML configuration file.

pub mod clock;
pub mod hid_gadget;
pub mod simulation;
pub mod storage;
pub mod vision;
