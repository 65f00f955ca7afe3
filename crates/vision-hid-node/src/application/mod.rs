//! Application layer use cases for the control node.
//!
//! - **`inject_keys`** – `KeyInjector`: characters and shortcuts to timed HID
//!   reports through an `InjectionChannel`.
//! - **`detect_layout`** – `LayoutDetector`: types a probe key and reads the
//!   screen back to tell QWERTY from QWERTZ.
//! - **`verify_injection`** – `InjectionOrchestrator`: types, reads back,
//!   corrects and retries until the text is confirmed on screen.
//! - **`control_node`** – `ControlNode`: owns one target's injector, detector
//!   and orchestrator.
//! - **`read_back`** / **`audit`** – the vision port and the bounded record of
//!   failed verifications.

pub mod audit;
pub mod control_node;
pub mod detect_layout;
pub mod inject_keys;
pub mod read_back;
pub mod verify_injection;
