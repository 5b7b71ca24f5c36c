//! Keyboard input encoding
//!
//! A key press becomes bytes for the child in one of two ways: a lookup in
//! the key table (`kmap`) for function and cursor keys, or the composed text
//! of the key with Ctrl and Alt folded in. Paste and focus reports are
//! encoded here too.

use bitflags::bitflags;
use tern_core::TermMode;

bitflags! {
    /// Modifier keys that take part in binding matches and mouse reports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModMask: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        const LOGO  = 1 << 3;
    }
}

/// Modifier requirement of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModMatch {
    /// Matches whatever is held
    Any,
    /// Matches only this exact combination
    Exact(ModMask),
}

impl ModMatch {
    pub fn matches(self, state: ModMask) -> bool {
        match self {
            ModMatch::Any => true,
            ModMatch::Exact(mask) => mask == state,
        }
    }
}

/// Whether a binding cares about a terminal mode being set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    DontCare,
    RequireOn,
    RequireOff,
}

impl TriState {
    pub fn accepts(self, on: bool) -> bool {
        match self {
            TriState::DontCare => true,
            TriState::RequireOn => on,
            TriState::RequireOff => !on,
        }
    }
}

/// Key identity after layout translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keysym {
    /// A key that produces a printable character
    Char(char),
    BackSpace,
    Tab,
    /// Shift+Tab
    IsoLeftTab,
    Return,
    Escape,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
    KpEnter,
    KpAdd,
    KpSubtract,
    KpMultiply,
    KpDivide,
    KpDecimal,
    KpDigit(u8),
    NumLock,
    /// Anything without a binding of its own (modifiers, media keys)
    Other,
}

impl Keysym {
    pub fn is_printable(self) -> bool {
        matches!(self, Keysym::Char(_))
    }
}

/// One row of the key table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub sym: Keysym,
    pub mods: ModMatch,
    pub output: String,
    /// Application keypad requirement
    pub appkey: TriState,
    /// Application cursor requirement
    pub appcursor: TriState,
    /// Skip this entry while Num Lock is on
    pub numlock_skip: bool,
}

impl KeyEntry {
    pub fn new(sym: Keysym, mods: ModMatch, output: &str) -> Self {
        Self {
            sym,
            mods,
            output: output.to_string(),
            appkey: TriState::DontCare,
            appcursor: TriState::DontCare,
            numlock_skip: false,
        }
    }

    pub fn appkey(mut self, appkey: TriState) -> Self {
        self.appkey = appkey;
        self
    }

    pub fn appcursor(mut self, appcursor: TriState) -> Self {
        self.appcursor = appcursor;
        self
    }

    pub fn numlock_skip(mut self) -> Self {
        self.numlock_skip = true;
        self
    }

    fn applies(&self, mods: ModMask, mode: TermMode, numlock: bool) -> bool {
        self.mods.matches(mods)
            && self.appkey.accepts(mode.contains(TermMode::APPKEYPAD))
            && !(numlock && self.numlock_skip)
            && self.appcursor.accepts(mode.contains(TermMode::APPCURSOR))
    }
}

/// Look a key up in the table; first applicable entry wins.
///
/// Printable keys are only looked up when listed in `mapped`; otherwise
/// their composed text is sent as is.
pub fn kmap<'a>(
    keys: &'a [KeyEntry],
    mapped: &[Keysym],
    sym: Keysym,
    mods: ModMask,
    mode: TermMode,
    numlock: bool,
) -> Option<&'a str> {
    if sym.is_printable() && !mapped.contains(&sym) {
        return None;
    }
    keys.iter()
        .find(|k| k.sym == sym && k.applies(mods, mode, numlock))
        .map(|k| k.output.as_str())
}

/// Fold Ctrl and Alt into the composed text of a key
pub fn compose(text: &str, mods: ModMask, eight_bit: bool) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    if bytes.len() != 1 {
        return bytes;
    }

    if mods.contains(ModMask::CTRL) {
        bytes[0] = ctrl_byte(bytes[0]);
    }

    if mods.contains(ModMask::ALT) {
        let b = bytes[0];
        if eight_bit {
            if b < 0o177 {
                let c = char::from(b | 0x80);
                let mut buf = [0u8; 4];
                bytes = c.encode_utf8(&mut buf).as_bytes().to_vec();
            }
        } else {
            bytes = vec![0x1b, b];
        }
    }
    bytes
}

fn ctrl_byte(b: u8) -> u8 {
    match b {
        b'@'..=b'~' | b' ' => b & 0x1f,
        b'2' => 0,
        b'3'..=b'7' => b - (b'3' - 0o33),
        b'8' => 0o177,
        b'/' => b'_' & 0x1f,
        _ => b,
    }
}

/// Bytes for pasted text: newlines become carriage returns, bracketed
/// when the child asked for it
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 12);
    if bracketed {
        out.extend_from_slice(b"\x1b[200~");
    }
    out.extend(text.bytes().map(|b| if b == b'\n' { b'\r' } else { b }));
    if bracketed {
        out.extend_from_slice(b"\x1b[201~");
    }
    out
}

/// Focus in/out report
pub fn encode_focus(focused: bool) -> &'static [u8] {
    if focused {
        b"\x1b[I"
    } else {
        b"\x1b[O"
    }
}
