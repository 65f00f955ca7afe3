//! Keyboard layout tables: character → (modifier mask, physical position).
//!
//! A [`LayoutTable`] is this engine's *belief* about how the target renders
//! key positions.  Typing a character means looking up which physical key
//! (plus which modifiers) the target's layout needs to produce it.
//!
//! # Supported layouts
//!
//! | Code | Physical arrangement | Notes |
//! |------|----------------------|-------|
//! | `US` | QWERTY (ANSI)        | shifted symbols through Left Shift |
//! | `DE` | QWERTZ (ISO)         | Y/Z positions swapped, `@ \ \| { } [ ] ~` through AltGr |
//!
//! # Uppercase derivation
//!
//! Uppercase letters are never written down by hand.  Each table is built
//! from its lowercase letter positions and the uppercase entries are derived
//! by adding Left Shift to the same position, so the two halves of a table
//! cannot drift apart.
//!
//! # Lifetime
//!
//! Tables are built once on first use and live for the rest of the process
//! (`&'static LayoutTable`).  Switching layouts means replacing a reference,
//! never mutating a table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::modifiers::ModifierMask;
use crate::keymap::hid::HidKeyCode;

/// Error type for layout selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown layout code '{0}' (expected US or DE)")]
    UnknownCode(String),
}

/// Identifier of a supported layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayoutCode {
    /// QWERTY-positional, US legends.
    Us,
    /// QWERTZ-positional, German ISO legends.
    De,
}

impl LayoutCode {
    pub const ALL: [LayoutCode; 2] = [LayoutCode::Us, LayoutCode::De];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutCode::Us => "US",
            LayoutCode::De => "DE",
        }
    }

    /// Returns the shared table for this layout.
    pub fn table(self) -> &'static LayoutTable {
        LayoutTable::for_code(self)
    }
}

impl fmt::Display for LayoutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutCode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" | "QWERTY" => Ok(LayoutCode::Us),
            "DE" | "QWERTZ" => Ok(LayoutCode::De),
            _ => Err(LayoutError::UnknownCode(s.to_string())),
        }
    }
}

/// One physical keystroke: the modifiers to hold and the position to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyStroke {
    pub modifiers: ModifierMask,
    pub key: HidKeyCode,
}

impl KeyStroke {
    pub const fn new(modifiers: ModifierMask, key: HidKeyCode) -> Self {
        Self { modifiers, key }
    }

    /// A keystroke with no modifiers held.
    pub const fn plain(key: HidKeyCode) -> Self {
        Self::new(ModifierMask::NONE, key)
    }
}

/// Immutable character → keystroke mapping for one layout.
#[derive(Debug)]
pub struct LayoutTable {
    code: LayoutCode,
    by_char: HashMap<char, KeyStroke>,
    by_stroke: HashMap<KeyStroke, char>,
}

impl LayoutTable {
    /// Returns the process-wide table for `code`, building it on first use.
    pub fn for_code(code: LayoutCode) -> &'static LayoutTable {
        static US: OnceLock<LayoutTable> = OnceLock::new();
        static DE: OnceLock<LayoutTable> = OnceLock::new();
        match code {
            LayoutCode::Us => US.get_or_init(build_us),
            LayoutCode::De => DE.get_or_init(build_de),
        }
    }

    /// The QWERTY-positional table.
    pub fn us() -> &'static LayoutTable {
        Self::for_code(LayoutCode::Us)
    }

    /// The QWERTZ-positional table.
    pub fn de() -> &'static LayoutTable {
        Self::for_code(LayoutCode::De)
    }

    pub fn code(&self) -> LayoutCode {
        self.code
    }

    /// Looks up the keystroke that produces `c` on this layout.
    ///
    /// `None` is the "no mapping" sentinel; it is up to the caller whether an
    /// unmapped character is fatal.
    pub fn lookup(&self, c: char) -> Option<KeyStroke> {
        self.by_char.get(&c).copied()
    }

    /// Reverse lookup: the character this layout renders for `stroke`.
    pub fn char_for(&self, stroke: KeyStroke) -> Option<char> {
        self.by_stroke.get(&stroke).copied()
    }

    /// Number of mapped characters.
    pub fn len(&self) -> usize {
        self.by_char.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_char.is_empty()
    }

    /// Iterates over every (character, keystroke) pair in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (char, KeyStroke)> + '_ {
        self.by_char.iter().map(|(&c, &s)| (c, s))
    }

    fn builder(code: LayoutCode) -> TableBuilder {
        TableBuilder {
            table: LayoutTable {
                code,
                by_char: HashMap::new(),
                by_stroke: HashMap::new(),
            },
        }
    }
}

/// Accumulates entries; the first character registered for a keystroke wins
/// the reverse mapping.
struct TableBuilder {
    table: LayoutTable,
}

impl TableBuilder {
    fn insert(&mut self, c: char, stroke: KeyStroke) {
        self.table.by_char.insert(c, stroke);
        self.table.by_stroke.entry(stroke).or_insert(c);
    }

    /// Registers unshifted letters and derives their Shift variants.
    fn letters(&mut self, letters: impl IntoIterator<Item = (char, HidKeyCode)>) {
        for (lower, key) in letters {
            let stroke = KeyStroke::plain(key);
            self.insert(lower, stroke);
            if let Some(upper) = single_uppercase(lower) {
                self.insert(upper, shifted(stroke));
            }
        }
    }

    fn plain(&mut self, entries: &[(char, HidKeyCode)]) {
        for &(c, key) in entries {
            self.insert(c, KeyStroke::plain(key));
        }
    }

    fn with(&mut self, modifiers: ModifierMask, entries: &[(char, HidKeyCode)]) {
        for &(c, key) in entries {
            self.insert(c, KeyStroke::new(modifiers, key));
        }
    }

    fn finish(self) -> LayoutTable {
        debug!(
            layout = %self.table.code,
            entries = self.table.by_char.len(),
            "layout table built"
        );
        self.table
    }
}

/// Adds Left Shift to `stroke`, keeping its position.
pub fn shifted(stroke: KeyStroke) -> KeyStroke {
    KeyStroke::new(stroke.modifiers | ModifierMask::LEFT_SHIFT, stroke.key)
}

/// Uppercase form of `c` when it is a single, distinct character (`ß` → `SS`
/// is not).
fn single_uppercase(c: char) -> Option<char> {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) if u != c => Some(u),
        _ => None,
    }
}

// ── Shared positions ─────────────────────────────────────────────────────────

/// Letter positions under their US legends.
const QWERTY_LETTERS: [(char, HidKeyCode); 26] = [
    ('a', HidKeyCode::KeyA),
    ('b', HidKeyCode::KeyB),
    ('c', HidKeyCode::KeyC),
    ('d', HidKeyCode::KeyD),
    ('e', HidKeyCode::KeyE),
    ('f', HidKeyCode::KeyF),
    ('g', HidKeyCode::KeyG),
    ('h', HidKeyCode::KeyH),
    ('i', HidKeyCode::KeyI),
    ('j', HidKeyCode::KeyJ),
    ('k', HidKeyCode::KeyK),
    ('l', HidKeyCode::KeyL),
    ('m', HidKeyCode::KeyM),
    ('n', HidKeyCode::KeyN),
    ('o', HidKeyCode::KeyO),
    ('p', HidKeyCode::KeyP),
    ('q', HidKeyCode::KeyQ),
    ('r', HidKeyCode::KeyR),
    ('s', HidKeyCode::KeyS),
    ('t', HidKeyCode::KeyT),
    ('u', HidKeyCode::KeyU),
    ('v', HidKeyCode::KeyV),
    ('w', HidKeyCode::KeyW),
    ('x', HidKeyCode::KeyX),
    ('y', HidKeyCode::KeyY),
    ('z', HidKeyCode::KeyZ),
];

const DIGITS: [(char, HidKeyCode); 10] = [
    ('1', HidKeyCode::Digit1),
    ('2', HidKeyCode::Digit2),
    ('3', HidKeyCode::Digit3),
    ('4', HidKeyCode::Digit4),
    ('5', HidKeyCode::Digit5),
    ('6', HidKeyCode::Digit6),
    ('7', HidKeyCode::Digit7),
    ('8', HidKeyCode::Digit8),
    ('9', HidKeyCode::Digit9),
    ('0', HidKeyCode::Digit0),
];

const WHITESPACE: [(char, HidKeyCode); 3] = [
    (' ', HidKeyCode::Space),
    ('\n', HidKeyCode::Enter),
    ('\t', HidKeyCode::Tab),
];

// ── US (QWERTY) ──────────────────────────────────────────────────────────────

const US_PUNCTUATION: [(char, HidKeyCode); 11] = [
    ('-', HidKeyCode::Minus),
    ('=', HidKeyCode::Equal),
    ('[', HidKeyCode::BracketLeft),
    (']', HidKeyCode::BracketRight),
    ('\\', HidKeyCode::Backslash),
    (';', HidKeyCode::Semicolon),
    ('\'', HidKeyCode::Quote),
    ('`', HidKeyCode::Backquote),
    (',', HidKeyCode::Comma),
    ('.', HidKeyCode::Period),
    ('/', HidKeyCode::Slash),
];

const US_SHIFTED: [(char, HidKeyCode); 21] = [
    ('!', HidKeyCode::Digit1),
    ('@', HidKeyCode::Digit2),
    ('#', HidKeyCode::Digit3),
    ('$', HidKeyCode::Digit4),
    ('%', HidKeyCode::Digit5),
    ('^', HidKeyCode::Digit6),
    ('&', HidKeyCode::Digit7),
    ('*', HidKeyCode::Digit8),
    ('(', HidKeyCode::Digit9),
    (')', HidKeyCode::Digit0),
    ('_', HidKeyCode::Minus),
    ('+', HidKeyCode::Equal),
    ('{', HidKeyCode::BracketLeft),
    ('}', HidKeyCode::BracketRight),
    ('|', HidKeyCode::Backslash),
    (':', HidKeyCode::Semicolon),
    ('"', HidKeyCode::Quote),
    ('~', HidKeyCode::Backquote),
    ('<', HidKeyCode::Comma),
    ('>', HidKeyCode::Period),
    ('?', HidKeyCode::Slash),
];

fn build_us() -> LayoutTable {
    let mut b = LayoutTable::builder(LayoutCode::Us);
    b.letters(QWERTY_LETTERS);
    b.plain(&DIGITS);
    b.plain(&WHITESPACE);
    b.plain(&US_PUNCTUATION);
    b.with(ModifierMask::LEFT_SHIFT, &US_SHIFTED);
    b.finish()
}

// ── DE (QWERTZ) ──────────────────────────────────────────────────────────────

/// Position of a letter on a QWERTZ board: the Y and Z legends trade places.
fn qwertz_position(c: char, key: HidKeyCode) -> HidKeyCode {
    match c {
        'y' => HidKeyCode::KeyZ,
        'z' => HidKeyCode::KeyY,
        _ => key,
    }
}

const DE_UMLAUTS: [(char, HidKeyCode); 3] = [
    ('ü', HidKeyCode::BracketLeft),
    ('ö', HidKeyCode::Semicolon),
    ('ä', HidKeyCode::Quote),
];

const DE_PUNCTUATION: [(char, HidKeyCode); 7] = [
    ('ß', HidKeyCode::Minus),
    ('+', HidKeyCode::BracketRight),
    ('#', HidKeyCode::NonUsHash),
    (',', HidKeyCode::Comma),
    ('.', HidKeyCode::Period),
    ('-', HidKeyCode::Slash),
    ('<', HidKeyCode::NonUsBackslash),
];

// `^` and `` ` `` sit on dead keys on this layout and are left unmapped.
const DE_SHIFTED: [(char, HidKeyCode); 18] = [
    ('!', HidKeyCode::Digit1),
    ('"', HidKeyCode::Digit2),
    ('§', HidKeyCode::Digit3),
    ('$', HidKeyCode::Digit4),
    ('%', HidKeyCode::Digit5),
    ('&', HidKeyCode::Digit6),
    ('/', HidKeyCode::Digit7),
    ('(', HidKeyCode::Digit8),
    (')', HidKeyCode::Digit9),
    ('=', HidKeyCode::Digit0),
    ('?', HidKeyCode::Minus),
    ('*', HidKeyCode::BracketRight),
    ('\'', HidKeyCode::NonUsHash),
    ('°', HidKeyCode::Backquote),
    (';', HidKeyCode::Comma),
    (':', HidKeyCode::Period),
    ('_', HidKeyCode::Slash),
    ('>', HidKeyCode::NonUsBackslash),
];

/// Symbols with no direct position on QWERTZ, reached through AltGr.
pub const DE_ALTGR: [(char, HidKeyCode); 8] = [
    ('@', HidKeyCode::KeyQ),
    ('{', HidKeyCode::Digit7),
    ('[', HidKeyCode::Digit8),
    (']', HidKeyCode::Digit9),
    ('}', HidKeyCode::Digit0),
    ('\\', HidKeyCode::Minus),
    ('~', HidKeyCode::BracketRight),
    ('|', HidKeyCode::NonUsBackslash),
];

fn build_de() -> LayoutTable {
    let mut b = LayoutTable::builder(LayoutCode::De);
    b.letters(
        QWERTY_LETTERS
            .iter()
            .map(|&(c, key)| (c, qwertz_position(c, key)))
            .chain(DE_UMLAUTS),
    );
    b.plain(&DIGITS);
    b.plain(&WHITESPACE);
    b.plain(&DE_PUNCTUATION);
    b.with(ModifierMask::LEFT_SHIFT, &DE_SHIFTED);
    b.with(ModifierMask::ALT_GR, &DE_ALTGR);
    b.finish()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
