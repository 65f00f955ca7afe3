//! What travels over the injection channel.
//!
//! The gadget accepts nothing but fixed-size boot keyboard reports, so the
//! whole "protocol" is the [`report::KeyReport`] layout.

pub mod report;
