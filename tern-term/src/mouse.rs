//! Mouse reporting
//!
//! [`encode_report`] turns one event into the bytes xterm would send for the
//! active protocol. [`MouseReporter`] adds the state reports depend on: the
//! last pressed button (for motion) and the cell of the last report.

use tern_core::TermMode;

use crate::input::ModMask;

/// Legacy coordinates are one byte offset by 32, so 222 is the largest
/// zero-based cell they can carry
const LEGACY_LIMIT: usize = 223;

/// UTF-8 coordinates stop at the two-byte limit
const UTF8_LIMIT: usize = 2015;

/// Button code meaning "released" in the legacy protocols
const RELEASE_CODE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Middle,
    Right,
    Other(u16),
}

impl Button {
    fn code(self) -> Option<u32> {
        match self {
            Button::Left => Some(0),
            Button::Middle => Some(1),
            Button::Right => Some(2),
            Button::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Coordinate encoding selected by DEC private modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Legacy,
    Utf8,
    Sgr,
}

impl Encoding {
    pub fn from_mode(mode: TermMode) -> Self {
        if mode.contains(TermMode::MOUSESGR) {
            Encoding::Sgr
        } else if mode.contains(TermMode::MOUSEUTF8) {
            Encoding::Utf8
        } else {
            Encoding::Legacy
        }
    }
}

/// Encode one report. `code` is the button code before modifiers; `release`
/// only matters for SGR. Returns `None` when the coordinates cannot be
/// represented.
pub fn encode_report(
    code: u32,
    release: bool,
    col: usize,
    row: usize,
    mods: ModMask,
    mode: TermMode,
) -> Option<Vec<u8>> {
    let mut code = code;
    if !mode.contains(TermMode::MOUSEX10) {
        if mods.contains(ModMask::SHIFT) {
            code += 4;
        }
        if mods.contains(ModMask::LOGO) {
            code += 8;
        }
        if mods.contains(ModMask::CTRL) {
            code += 16;
        }
    }

    match Encoding::from_mode(mode) {
        Encoding::Sgr => {
            let terminator = if release { 'm' } else { 'M' };
            Some(format!("\x1b[<{};{};{}{}", code, col + 1, row + 1, terminator).into_bytes())
        }
        Encoding::Utf8 => {
            if col >= UTF8_LIMIT || row >= UTF8_LIMIT {
                return None;
            }
            let mut out = b"\x1b[M".to_vec();
            for value in [32 + code, 32 + col as u32 + 1, 32 + row as u32 + 1] {
                push_utf8(&mut out, value);
            }
            Some(out)
        }
        Encoding::Legacy => {
            if col >= LEGACY_LIMIT || row >= LEGACY_LIMIT {
                return None;
            }
            Some(vec![
                0x1b,
                b'[',
                b'M',
                (32 + code) as u8,
                (32 + col + 1) as u8,
                (32 + row + 1) as u8,
            ])
        }
    }
}

fn push_utf8(out: &mut Vec<u8>, value: u32) {
    if let Some(c) = char::from_u32(value) {
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

/// Mouse reporting state for one window
#[derive(Debug, Clone)]
pub struct MouseReporter {
    /// Code of the button last pressed, or the release code
    last_button: u32,
    /// Cell the pointer is over
    pointer: (usize, usize),
    /// Cell of the last motion report
    reported: (usize, usize),
}

impl Default for MouseReporter {
    fn default() -> Self {
        Self {
            last_button: RELEASE_CODE,
            pointer: (0, 0),
            reported: (0, 0),
        }
    }
}

impl MouseReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> (usize, usize) {
        self.pointer
    }

    /// Track the pointer without reporting
    pub fn set_pointer(&mut self, col: usize, row: usize) {
        self.pointer = (col, row);
    }

    pub fn button(
        &mut self,
        button: Button,
        pressed: bool,
        mods: ModMask,
        mode: TermMode,
    ) -> Option<Vec<u8>> {
        let sgr = mode.contains(TermMode::MOUSESGR);
        let code = if !pressed && !sgr {
            RELEASE_CODE
        } else {
            button.code()?
        };
        self.last_button = if pressed { code } else { RELEASE_CODE };

        if mode.contains(TermMode::MOUSEX10) && !pressed {
            return None;
        }
        let (col, row) = self.pointer;
        encode_report(code, !pressed, col, row, mods, mode)
    }

    pub fn motion(
        &mut self,
        col: usize,
        row: usize,
        mods: ModMask,
        mode: TermMode,
    ) -> Option<Vec<u8>> {
        self.pointer = (col, row);
        if (col, row) == self.reported {
            return None;
        }
        if !mode.intersects(TermMode::MOUSEMOTION | TermMode::MOUSEMANY) {
            return None;
        }
        if mode.contains(TermMode::MOUSEMOTION) && self.last_button == RELEASE_CODE {
            return None;
        }
        self.reported = (col, row);
        encode_report(self.last_button + 32, false, col, row, mods, mode)
    }

    /// Scroll report; `value` follows the display convention where positive
    /// scrolls down or right
    pub fn axis(&self, axis: Axis, value: f64, mods: ModMask, mode: TermMode) -> Option<Vec<u8>> {
        let mut code = 64 + if axis == Axis::Vertical { 4 } else { 6 };
        if value > 0.0 {
            code += 1;
        }
        let (col, row) = self.pointer;
        encode_report(code, false, col, row, mods, mode)
    }
}
