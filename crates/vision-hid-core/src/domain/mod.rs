//! Pure keyboard domain logic with no OS or I/O dependencies.
//!
//! - [`layout`]: per-layout character → keystroke tables.
//! - [`modifiers`]: the modifier bit-set of a boot report.

pub mod layout;
pub mod modifiers;
