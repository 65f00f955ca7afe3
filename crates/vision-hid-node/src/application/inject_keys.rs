//! KeyInjector: turns characters and shortcuts into timed HID reports.
//!
//! The injector owns the hardware-facing half of the engine.  It looks each
//! character up in the active [`LayoutTable`], writes a press report, holds it
//! for a humanised interval, writes the all-zero release report and then waits
//! a normally distributed inter-key delay before the next character.
//!
//! # Best effort at the hardware layer
//!
//! The gadget gives no acknowledgement, so a failed write is logged and the
//! typing loop carries on.  Reliability is restored one level up, by the
//! verify-and-retry loop in [`super::verify_injection`].
//!
//! # Ports
//!
//! - [`InjectionChannel`]: where reports go (`/dev/hidg0`, a simulated target,
//!   or a recording fake in tests).
//! - [`Clock`]: every wait goes through it, so tests can observe hold and
//!   cadence intervals without sleeping.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use vision_hid_core::{KeyMapper, KeyReport, KeyStroke, LayoutCode, LayoutTable, ModifierMask};

/// Shortest inter-key delay ever used, whatever the sampled cadence says.
pub const MIN_INTER_KEY_DELAY: Duration = Duration::from_millis(10);

/// Standard deviation of the cadence as a fraction of its mean when only a
/// mean delay is given.
pub const CADENCE_JITTER_RATIO: f64 = 0.3;

/// Error type for report writes.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("I/O error writing HID report to {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("injection channel error: {0}")]
    Other(String),
}

/// Error type for shortcut requests that cannot be resolved.
///
/// Neither case performs any I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("unknown modifier '{0}' (expected CTRL, ALT, SHIFT, GUI or RALT)")]
    UnknownModifier(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Sink for boot keyboard reports.
pub trait InjectionChannel: Send + Sync {
    /// Writes one 8-byte report.
    fn write_report(&self, report: &KeyReport) -> Result<(), ChannelError>;

    /// `true` when reports are built and timed but go nowhere.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Blocking waits on the calling thread.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Distribution of the pause between two typed characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    pub mean: Duration,
    pub std_dev: Duration,
}

impl Cadence {
    pub fn new(mean: Duration, std_dev: Duration) -> Self {
        Self { mean, std_dev }
    }

    /// Cadence with the given mean and a standard deviation of
    /// [`CADENCE_JITTER_RATIO`] times the mean.
    pub fn from_delay_ms(delay_ms: u64) -> Self {
        let mean = Duration::from_millis(delay_ms);
        Self::new(mean, mean.mul_f64(CADENCE_JITTER_RATIO))
    }

    /// Draws one inter-key delay, floored at [`MIN_INTER_KEY_DELAY`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let mean_ms = self.mean.as_secs_f64() * 1000.0;
        let std_ms = self.std_dev.as_secs_f64() * 1000.0;
        let sampled_ms = match Normal::new(mean_ms, std_ms) {
            Ok(dist) => dist.sample(rng),
            Err(_) => mean_ms,
        };
        let floor_ms = MIN_INTER_KEY_DELAY.as_secs_f64() * 1000.0;
        Duration::from_secs_f64(sampled_ms.max(floor_ms) / 1000.0)
    }
}

/// Timing of individual key presses.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingSettings {
    /// Lower bound of the uniformly random hold of a typed character.
    pub hold_min: Duration,
    /// Upper bound of the uniformly random hold of a typed character.
    pub hold_max: Duration,
    /// Fixed hold of a shortcut chord.
    pub shortcut_hold: Duration,
}

impl Default for TypingSettings {
    fn default() -> Self {
        Self {
            hold_min: Duration::from_millis(10),
            hold_max: Duration::from_millis(30),
            shortcut_hold: Duration::from_millis(100),
        }
    }
}

/// Writes keystrokes for the active layout to an [`InjectionChannel`].
pub struct KeyInjector {
    channel: Arc<dyn InjectionChannel>,
    clock: Arc<dyn Clock>,
    layout: RwLock<&'static LayoutTable>,
    settings: TypingSettings,
}

impl KeyInjector {
    pub fn new(
        channel: Arc<dyn InjectionChannel>,
        clock: Arc<dyn Clock>,
        layout: LayoutCode,
        settings: TypingSettings,
    ) -> Self {
        Self {
            channel,
            clock,
            layout: RwLock::new(layout.table()),
            settings,
        }
    }

    /// The table used for the next keystroke.
    pub fn layout(&self) -> &'static LayoutTable {
        *self.layout.read()
    }

    pub fn layout_code(&self) -> LayoutCode {
        self.layout().code()
    }

    /// Swaps the active table; takes effect on the very next keystroke.
    pub fn set_layout(&self, code: LayoutCode) {
        let mut active = self.layout.write();
        if active.code() != code {
            info!(from = %active.code(), to = %code, "switching keyboard layout");
        }
        *active = code.table();
    }

    pub fn is_simulated(&self) -> bool {
        self.channel.is_simulated()
    }

    /// Presses and releases the key producing `c` on the active layout.
    ///
    /// Returns `false` (after a warning, with no report sent) when `c` has no
    /// mapping.
    pub fn press_and_release(&self, c: char) -> bool {
        self.press_and_release_on(self.layout(), c)
    }

    /// Types `text` on the active layout with humanised cadence.
    ///
    /// Returns the number of characters skipped because they were unmapped.
    pub fn type_text(&self, text: &str, cadence: Cadence) -> usize {
        self.type_chars(text, cadence, None)
    }

    /// Types `text` through `table` instead of the active layout.
    ///
    /// The layout detector uses this to press a fixed physical position no
    /// matter what the engine currently believes about the target.
    pub fn type_text_on(&self, table: &'static LayoutTable, text: &str, cadence: Cadence) -> usize {
        self.type_chars(text, cadence, Some(table))
    }

    /// Presses a chord such as CTRL+ALT+DELETE.
    ///
    /// `key` is a named key (`ENTER`, `ESC`, `F5`, ...) or a single character,
    /// resolved to a position through the active layout.  Nothing is written
    /// if a modifier or the key cannot be resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ShortcutError`] for an unknown modifier name or key.
    pub fn press_sequence<S: AsRef<str>>(
        &self,
        modifiers: &[S],
        key: &str,
    ) -> Result<(), ShortcutError> {
        let mut mask = ModifierMask::NONE;
        for name in modifiers {
            let name = name.as_ref();
            match ModifierMask::from_name(name) {
                Some(bit) => mask |= bit,
                None => {
                    warn!(modifier = name, "unknown modifier in shortcut; nothing sent");
                    return Err(ShortcutError::UnknownModifier(name.to_string()));
                }
            }
        }

        let Some(code) = KeyMapper::resolve(key, self.layout()) else {
            warn!(key, "unknown key name in shortcut; nothing sent");
            return Err(ShortcutError::UnknownKey(key.to_string()));
        };

        debug!(modifiers = %mask, key = ?code, "pressing shortcut");
        self.tap(KeyStroke::new(mask, code), self.settings.shortcut_hold);
        Ok(())
    }

    fn type_chars(&self, text: &str, cadence: Cadence, fixed: Option<&'static LayoutTable>) -> usize {
        let mut rng = rand::thread_rng();
        let mut unmapped = 0;
        for c in text.chars() {
            let table = fixed.unwrap_or_else(|| self.layout());
            if !self.press_and_release_on(table, c) {
                unmapped += 1;
            }
            self.clock.sleep(cadence.sample(&mut rng));
        }
        unmapped
    }

    fn press_and_release_on(&self, table: &LayoutTable, c: char) -> bool {
        let Some(stroke) = table.lookup(c) else {
            warn!(character = ?c, layout = %table.code(), "no mapping for character; skipped");
            return false;
        };
        let hold = self.random_hold();
        self.tap(stroke, hold);
        true
    }

    /// Press report, hold, release report.
    fn tap(&self, stroke: KeyStroke, hold: Duration) {
        self.send(&KeyReport::for_stroke(stroke));
        self.clock.sleep(hold);
        self.send(&KeyReport::release());
    }

    fn send(&self, report: &KeyReport) {
        if let Err(e) = self.channel.write_report(report) {
            error!("error writing to HID device: {e}");
        }
    }

    fn random_hold(&self) -> Duration {
        let min = self.settings.hold_min.as_micros() as u64;
        let max = self.settings.hold_max.as_micros() as u64;
        if max <= min {
            return self.settings.hold_min;
        }
        Duration::from_micros(rand::thread_rng().gen_range(min..=max))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
