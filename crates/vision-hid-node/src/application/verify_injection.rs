//! InjectionOrchestrator: typed text confirmed by screen read-back.
//!
//! # The verify-and-retry loop
//!
//! ```text
//!  attempt 1..=max_attempts:
//!      type text ─► settle ─► read screen ─► contains trimmed text? ── yes ─► Ok
//!                                                 │ no
//!                                                 ▼
//!                                          record failure
//!                                                 │ (not the last attempt)
//!                                                 ▼
//!                                    corrective action ─► cooldown
//!  all attempts failed ─► InjectionError::VerificationFailed
//! ```
//!
//! The corrective action (CTRL+C by default) clears whatever partial input
//! the failed attempt left behind.  Its own failure never aborts the loop.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::audit::{AuditTrail, VerificationFailure};
use super::inject_keys::{Cadence, Clock, KeyInjector, ShortcutError};
use super::read_back::{read_screen, VisionSource};

/// Error type for orchestrated injections.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("failed to verify text {text:?} after {attempts} attempts")]
    VerificationFailed { text: String, attempts: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Shortcut(#[from] ShortcutError),
}

/// Recovery step between two failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectiveAction {
    /// CTRL+C, which abandons the current line in a shell.
    #[default]
    ClearLine,
    /// A single ESC press.
    Escape,
    /// Retry without any recovery keystroke.
    #[serde(rename = "none")]
    Skip,
}

impl CorrectiveAction {
    pub fn apply(self, injector: &KeyInjector) -> Result<(), ShortcutError> {
        match self {
            Self::ClearLine => injector.press_sequence(&["CTRL"], "c"),
            Self::Escape => injector.press_sequence::<&str>(&[], "ESC"),
            Self::Skip => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifySettings {
    pub max_attempts: u32,
    /// Pause between typing and reading the screen.
    pub settle: Duration,
    /// Pause after the corrective action, before the next attempt.
    pub cooldown: Duration,
    pub corrective: CorrectiveAction,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle: Duration::from_secs(1),
            cooldown: Duration::from_millis(500),
            corrective: CorrectiveAction::ClearLine,
        }
    }
}

/// Successful result of [`InjectionOrchestrator::inject_verified`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionOutcome {
    /// `false` when verification was not requested.
    pub verified: bool,
    /// Typing rounds performed, including the successful one.
    pub attempts: u32,
    /// Characters in the requested text.
    pub characters: usize,
}

pub struct InjectionOrchestrator {
    injector: Arc<KeyInjector>,
    vision: Arc<dyn VisionSource>,
    clock: Arc<dyn Clock>,
    settings: VerifySettings,
    audit: Mutex<AuditTrail>,
}

impl InjectionOrchestrator {
    pub fn new(
        injector: Arc<KeyInjector>,
        vision: Arc<dyn VisionSource>,
        clock: Arc<dyn Clock>,
        settings: VerifySettings,
    ) -> Self {
        Self {
            injector,
            vision,
            clock,
            settings,
            audit: Mutex::new(AuditTrail::default()),
        }
    }

    /// Types `text` and, when `verify` is set, confirms it appeared on screen.
    ///
    /// # Errors
    ///
    /// - [`InjectionError::InvalidArgument`] for empty or whitespace-only
    ///   text when `verify` is set, since a read-back has nothing to confirm.
    ///   Without verification such text is typed as is.
    /// - [`InjectionError::VerificationFailed`] once every attempt failed.
    pub fn inject_verified(
        &self,
        text: &str,
        cadence: Cadence,
        verify: bool,
    ) -> Result<InjectionOutcome, InjectionError> {
        let expected = text.trim();
        if verify && expected.is_empty() {
            return Err(InjectionError::InvalidArgument(
                "empty or whitespace-only text cannot be verified; disable verification"
                    .to_string(),
            ));
        }
        let characters = text.chars().count();

        if !verify {
            self.type_once(text, cadence);
            return Ok(InjectionOutcome {
                verified: false,
                attempts: 1,
                characters,
            });
        }

        let max_attempts = self.settings.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            self.type_once(text, cadence);
            self.clock.sleep(self.settings.settle);

            let observed = read_screen(self.vision.as_ref());
            if observed.contains(expected) {
                info!(attempt, characters, "text verified on screen");
                return Ok(InjectionOutcome {
                    verified: true,
                    attempts: attempt,
                    characters,
                });
            }

            warn!(attempt, max_attempts, "verification failed: typed text not found on screen");
            self.audit
                .lock()
                .record(VerificationFailure::now(attempt, text, &observed));

            if attempt < max_attempts {
                if let Err(e) = self.settings.corrective.apply(&self.injector) {
                    ignore_corrective_failure(e);
                }
                self.clock.sleep(self.settings.cooldown);
            }
        }

        error!(attempts = max_attempts, "giving up on verified injection");
        Err(InjectionError::VerificationFailed {
            text: text.to_string(),
            attempts: max_attempts,
        })
    }

    /// Presses a shortcut once, without verification.
    pub fn execute_shortcut<S: AsRef<str>>(
        &self,
        modifiers: &[S],
        key: &str,
    ) -> Result<(), InjectionError> {
        self.injector.press_sequence(modifiers, key)?;
        Ok(())
    }

    pub fn audit_trail(&self) -> Vec<VerificationFailure> {
        self.audit.lock().snapshot()
    }

    fn type_once(&self, text: &str, cadence: Cadence) {
        let skipped = self.injector.type_text(text, cadence);
        if skipped > 0 {
            debug!(skipped, layout = %self.injector.layout_code(), "characters without mapping were skipped");
        }
    }
}

/// The corrective action is best effort; a failure must not end the retry
/// loop.
fn ignore_corrective_failure(err: ShortcutError) {
    debug!("corrective action failed, continuing: {err}");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
