//! Vision read-back port.
//!
//! A [`VisionSource`] returns whatever text is currently readable on the
//! target's screen.  Both the layout detector and the verify-and-retry loop
//! consume it; neither cares whether the text comes from an OCR pipeline, a
//! simulated terminal or a scripted fake.

use thiserror::Error;
use tracing::{debug, warn};

/// Error type for screen read-back.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision channel unavailable: {0}")]
    Unavailable(String),

    #[error("vision command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("I/O error running vision command: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of the text currently visible on the target screen.
pub trait VisionSource: Send + Sync {
    fn capture_text(&self) -> Result<String, VisionError>;
}

/// Reads the screen, treating a failed read as an empty screen.
///
/// An empty read-back never matches verified text and classifies as an
/// unknown layout, so a broken vision channel degrades into "not verified"
/// rather than aborting the caller.
pub fn read_screen(vision: &dyn VisionSource) -> String {
    match vision.capture_text() {
        Ok(text) => {
            debug!(chars = text.chars().count(), "screen read back");
            text
        }
        Err(e) => {
            warn!("screen read-back failed: {e}");
            String::new()
        }
    }
}
