//! Built-in binding tables
//!
//! Keys, keyboard shortcuts, pointer shortcuts and the selection modifier
//! rules. Tables are scanned in order and the first match wins, so more
//! specific modifier combinations come before `ModMatch::Any` rows.

use crate::input::{KeyEntry, Keysym, ModMask, ModMatch, TriState};
use crate::mouse::{Axis, Button};
use crate::selection::SelectionType;

/// Something a shortcut does instead of sending the key
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Change the font size by this many points
    Zoom(f32),
    ZoomReset,
    /// Copy the current selection to the clipboard
    ClipCopy,
    /// Paste the clipboard
    ClipPaste,
    /// Paste the primary selection
    SelPaste,
    /// Toggle the local Num Lock flag
    NumLock,
    /// Send a fixed string to the child
    Send(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub mods: ModMatch,
    pub sym: Keysym,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseShortcut {
    pub mods: ModMatch,
    pub button: Button,
    pub action: Action,
}

/// Scroll wheel binding; `dir` is the sign of the axis value
#[derive(Debug, Clone, PartialEq)]
pub struct AxisShortcut {
    pub mods: ModMatch,
    pub axis: Axis,
    pub dir: i8,
    pub output: String,
}

#[derive(Debug, Clone)]
pub struct Bindings {
    pub keys: Vec<KeyEntry>,
    /// Printable keys that are looked up in `keys` anyway
    pub mapped_keys: Vec<Keysym>,
    pub shortcuts: Vec<Shortcut>,
    pub mouse_shortcuts: Vec<MouseShortcut>,
    pub axis_shortcuts: Vec<AxisShortcut>,
    /// Selection type chosen by the modifiers held at press time
    pub sel_masks: Vec<(ModMatch, SelectionType)>,
    /// Holding this selects even while the child grabs the mouse
    pub force_sel_mod: ModMask,
}

impl Bindings {
    pub fn shortcut(&self, sym: Keysym, mods: ModMask) -> Option<&Action> {
        self.shortcuts
            .iter()
            .find(|s| s.sym == sym && s.mods.matches(mods))
            .map(|s| &s.action)
    }

    pub fn mouse_shortcut(&self, button: Button, mods: ModMask) -> Option<&Action> {
        self.mouse_shortcuts
            .iter()
            .find(|s| s.button == button && s.mods.matches(mods))
            .map(|s| &s.action)
    }

    pub fn axis_shortcut(&self, axis: Axis, value: f64, mods: ModMask) -> Option<&str> {
        let dir: i8 = if value > 0.0 {
            1
        } else if value < 0.0 {
            -1
        } else {
            return None;
        };
        self.axis_shortcuts
            .iter()
            .find(|s| s.axis == axis && s.dir == dir && s.mods.matches(mods))
            .map(|s| s.output.as_str())
    }

    /// First matching rule wins; regular otherwise
    pub fn selection_type(&self, mods: ModMask) -> SelectionType {
        self.sel_masks
            .iter()
            .find(|(mask, _)| mask.matches(mods))
            .map(|(_, ty)| *ty)
            .unwrap_or(SelectionType::Regular)
    }
}

impl Default for Bindings {
    fn default() -> Self {
        let term_mod = ModMatch::Exact(ModMask::CTRL | ModMask::SHIFT);
        let shortcut = |mods, sym, action| Shortcut { mods, sym, action };
        Self {
            keys: default_keys(),
            mapped_keys: Vec::new(),
            shortcuts: vec![
                shortcut(term_mod, Keysym::PageUp, Action::Zoom(1.0)),
                shortcut(term_mod, Keysym::PageDown, Action::Zoom(-1.0)),
                shortcut(term_mod, Keysym::Home, Action::ZoomReset),
                shortcut(term_mod, Keysym::Char('C'), Action::ClipCopy),
                shortcut(term_mod, Keysym::Char('V'), Action::ClipPaste),
                shortcut(term_mod, Keysym::Char('Y'), Action::SelPaste),
                shortcut(ModMatch::Exact(ModMask::SHIFT), Keysym::Insert, Action::SelPaste),
                shortcut(term_mod, Keysym::NumLock, Action::NumLock),
            ],
            mouse_shortcuts: Vec::new(),
            axis_shortcuts: vec![
                AxisShortcut {
                    mods: ModMatch::Any,
                    axis: Axis::Vertical,
                    dir: -1,
                    output: "\x19".to_string(),
                },
                AxisShortcut {
                    mods: ModMatch::Any,
                    axis: Axis::Vertical,
                    dir: 1,
                    output: "\x05".to_string(),
                },
            ],
            sel_masks: vec![(ModMatch::Exact(ModMask::ALT), SelectionType::Rectangular)],
            force_sel_mod: ModMask::SHIFT,
        }
    }
}

/// xterm modifier parameter for a modifier combination
fn modifier_param(mods: ModMask) -> u8 {
    let mut param = 1;
    if mods.contains(ModMask::SHIFT) {
        param += 1;
    }
    if mods.contains(ModMask::ALT) {
        param += 2;
    }
    if mods.contains(ModMask::CTRL) {
        param += 4;
    }
    param
}

fn default_keys() -> Vec<KeyEntry> {
    use Keysym::*;
    use TriState::{RequireOff, RequireOn};

    let any = ModMatch::Any;
    let exact = ModMatch::Exact;
    let none = ModMatch::Exact(ModMask::empty());
    let shift = ModMatch::Exact(ModMask::SHIFT);
    let ctrl = ModMatch::Exact(ModMask::CTRL);
    let alt = ModMatch::Exact(ModMask::ALT);

    let mut keys = Vec::new();

    for (sym, final_byte) in [(Up, 'A'), (Down, 'B'), (Right, 'C'), (Left, 'D')] {
        let combos = [
            ModMask::SHIFT,
            ModMask::ALT,
            ModMask::SHIFT | ModMask::ALT,
            ModMask::CTRL,
            ModMask::SHIFT | ModMask::CTRL,
            ModMask::CTRL | ModMask::ALT,
            ModMask::CTRL | ModMask::ALT | ModMask::SHIFT,
        ];
        for mods in combos {
            let seq = format!("\x1b[1;{}{}", modifier_param(mods), final_byte);
            keys.push(KeyEntry::new(sym, exact(mods), &seq));
        }
        keys.push(KeyEntry::new(sym, any, &format!("\x1b[{}", final_byte)).appcursor(RequireOff));
        keys.push(KeyEntry::new(sym, any, &format!("\x1bO{}", final_byte)).appcursor(RequireOn));
    }

    keys.push(KeyEntry::new(IsoLeftTab, shift, "\x1b[Z"));
    keys.push(KeyEntry::new(Return, alt, "\x1b\r"));
    keys.push(KeyEntry::new(Return, any, "\r"));

    keys.push(KeyEntry::new(Insert, shift, "\x1b[4l").appkey(RequireOff));
    keys.push(KeyEntry::new(Insert, shift, "\x1b[2;2~").appkey(RequireOn));
    keys.push(KeyEntry::new(Insert, ctrl, "\x1b[L").appkey(RequireOff));
    keys.push(KeyEntry::new(Insert, ctrl, "\x1b[2;5~").appkey(RequireOn));
    keys.push(KeyEntry::new(Insert, any, "\x1b[4h").appkey(RequireOff));
    keys.push(KeyEntry::new(Insert, any, "\x1b[2~").appkey(RequireOn));

    keys.push(KeyEntry::new(Delete, ctrl, "\x1b[M").appkey(RequireOff));
    keys.push(KeyEntry::new(Delete, ctrl, "\x1b[3;5~").appkey(RequireOn));
    keys.push(KeyEntry::new(Delete, shift, "\x1b[2K").appkey(RequireOff));
    keys.push(KeyEntry::new(Delete, shift, "\x1b[3;2~").appkey(RequireOn));
    keys.push(KeyEntry::new(Delete, any, "\x1b[P").appkey(RequireOff));
    keys.push(KeyEntry::new(Delete, any, "\x1b[3~").appkey(RequireOn));

    keys.push(KeyEntry::new(BackSpace, none, "\x7f"));
    keys.push(KeyEntry::new(BackSpace, alt, "\x1b\x7f"));

    keys.push(KeyEntry::new(Home, shift, "\x1b[2J").appcursor(RequireOff));
    keys.push(KeyEntry::new(Home, shift, "\x1b[1;2H").appcursor(RequireOn));
    keys.push(KeyEntry::new(Home, any, "\x1b[H").appcursor(RequireOff));
    keys.push(KeyEntry::new(Home, any, "\x1b[1~").appcursor(RequireOn));

    keys.push(KeyEntry::new(End, ctrl, "\x1b[J").appkey(RequireOff));
    keys.push(KeyEntry::new(End, ctrl, "\x1b[1;5F").appkey(RequireOn));
    keys.push(KeyEntry::new(End, shift, "\x1b[K").appkey(RequireOff));
    keys.push(KeyEntry::new(End, shift, "\x1b[1;2F").appkey(RequireOn));
    keys.push(KeyEntry::new(End, any, "\x1b[4~"));

    for (sym, code) in [(PageUp, 5), (PageDown, 6)] {
        keys.push(KeyEntry::new(sym, ctrl, &format!("\x1b[{};5~", code)));
        keys.push(KeyEntry::new(sym, shift, &format!("\x1b[{};2~", code)));
        keys.push(KeyEntry::new(sym, any, &format!("\x1b[{}~", code)));
    }

    // F1-F4 use SS3 unmodified and CSI 1;m with modifiers
    for (n, final_byte) in [(1, 'P'), (2, 'Q'), (3, 'R'), (4, 'S')] {
        keys.push(KeyEntry::new(F(n), none, &format!("\x1bO{}", final_byte)));
        for (mods, param) in function_key_mods() {
            let seq = format!("\x1b[1;{}{}", param, final_byte);
            keys.push(KeyEntry::new(F(n), exact(mods), &seq));
        }
    }
    for (n, code) in [(5, 15), (6, 17), (7, 18), (8, 19), (9, 20), (10, 21), (11, 23), (12, 24)] {
        keys.push(KeyEntry::new(F(n), none, &format!("\x1b[{}~", code)));
        for (mods, param) in function_key_mods() {
            let seq = format!("\x1b[{};{}~", code, param);
            keys.push(KeyEntry::new(F(n), exact(mods), &seq));
        }
    }

    let keypad = [
        (KpEnter, "\x1bOM"),
        (KpMultiply, "\x1bOj"),
        (KpAdd, "\x1bOk"),
        (KpSubtract, "\x1bOm"),
        (KpDecimal, "\x1bOn"),
        (KpDivide, "\x1bOo"),
    ];
    for (sym, seq) in keypad {
        keys.push(KeyEntry::new(sym, any, seq).appkey(RequireOn).numlock_skip());
    }
    keys.push(KeyEntry::new(KpEnter, any, "\r").appkey(RequireOff));
    for digit in 0..=9u8 {
        let seq = format!("\x1bO{}", char::from(b'p' + digit));
        keys.push(KeyEntry::new(KpDigit(digit), any, &seq).appkey(RequireOn).numlock_skip());
    }

    keys
}

fn function_key_mods() -> [(ModMask, u8); 4] {
    [
        (ModMask::SHIFT, 2),
        (ModMask::ALT, 3),
        (ModMask::CTRL, 5),
        (ModMask::LOGO, 6),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::kmap;
    use tern_core::TermMode;

    fn lookup(sym: Keysym, mods: ModMask, mode: TermMode) -> Option<String> {
        let b = Bindings::default();
        kmap(&b.keys, &b.mapped_keys, sym, mods, mode, false).map(str::to_string)
    }

    #[test]
    fn test_arrow_keys() {
        let normal = TermMode::empty();
        assert_eq!(lookup(Keysym::Up, ModMask::empty(), normal).as_deref(), Some("\x1b[A"));
        assert_eq!(
            lookup(Keysym::Left, ModMask::empty(), TermMode::APPCURSOR).as_deref(),
            Some("\x1bOD")
        );
        assert_eq!(lookup(Keysym::Right, ModMask::CTRL, normal).as_deref(), Some("\x1b[1;5C"));
        assert_eq!(
            lookup(Keysym::Down, ModMask::SHIFT | ModMask::ALT, normal).as_deref(),
            Some("\x1b[1;4B")
        );
    }

    #[test]
    fn test_function_keys() {
        let normal = TermMode::empty();
        assert_eq!(lookup(Keysym::F(1), ModMask::empty(), normal).as_deref(), Some("\x1bOP"));
        assert_eq!(lookup(Keysym::F(1), ModMask::SHIFT, normal).as_deref(), Some("\x1b[1;2P"));
        assert_eq!(lookup(Keysym::F(5), ModMask::empty(), normal).as_deref(), Some("\x1b[15~"));
        assert_eq!(lookup(Keysym::F(12), ModMask::CTRL, normal).as_deref(), Some("\x1b[24;5~"));
    }

    #[test]
    fn test_editing_keys_follow_keypad_mode() {
        let normal = TermMode::empty();
        assert_eq!(lookup(Keysym::Delete, ModMask::empty(), normal).as_deref(), Some("\x1b[P"));
        assert_eq!(
            lookup(Keysym::Delete, ModMask::empty(), TermMode::APPKEYPAD).as_deref(),
            Some("\x1b[3~")
        );
        assert_eq!(lookup(Keysym::BackSpace, ModMask::empty(), normal).as_deref(), Some("\x7f"));
        assert_eq!(lookup(Keysym::BackSpace, ModMask::CTRL, normal), None);
        assert_eq!(lookup(Keysym::PageUp, ModMask::empty(), normal).as_deref(), Some("\x1b[5~"));
    }

    #[test]
    fn test_printable_keys_are_not_mapped() {
        assert_eq!(lookup(Keysym::Char('a'), ModMask::empty(), TermMode::empty()), None);
    }

    #[test]
    fn test_shortcuts() {
        let b = Bindings::default();
        let term = ModMask::CTRL | ModMask::SHIFT;
        assert_eq!(b.shortcut(Keysym::PageUp, term), Some(&Action::Zoom(1.0)));
        assert_eq!(b.shortcut(Keysym::Char('V'), term), Some(&Action::ClipPaste));
        assert_eq!(b.shortcut(Keysym::Insert, ModMask::SHIFT), Some(&Action::SelPaste));
        assert_eq!(b.shortcut(Keysym::PageUp, ModMask::CTRL), None);
    }

    #[test]
    fn test_axis_shortcuts() {
        let b = Bindings::default();
        assert_eq!(b.axis_shortcut(Axis::Vertical, -1.0, ModMask::empty()), Some("\x19"));
        assert_eq!(b.axis_shortcut(Axis::Vertical, 3.0, ModMask::CTRL), Some("\x05"));
        assert_eq!(b.axis_shortcut(Axis::Horizontal, 1.0, ModMask::empty()), None);
        assert_eq!(b.axis_shortcut(Axis::Vertical, 0.0, ModMask::empty()), None);
    }

    #[test]
    fn test_selection_type_from_modifiers() {
        let b = Bindings::default();
        assert_eq!(b.selection_type(ModMask::empty()), SelectionType::Regular);
        assert_eq!(b.selection_type(ModMask::ALT), SelectionType::Rectangular);
        assert_eq!(b.selection_type(ModMask::ALT | ModMask::CTRL), SelectionType::Regular);
    }

    #[test]
    fn test_mouse_shortcut_lookup() {
        let mut b = Bindings::default();
        b.mouse_shortcuts.push(MouseShortcut {
            mods: ModMatch::Exact(ModMask::SHIFT),
            button: Button::Right,
            action: Action::Send("\x1b[5;2~".to_string()),
        });
        assert_eq!(
            b.mouse_shortcut(Button::Right, ModMask::SHIFT),
            Some(&Action::Send("\x1b[5;2~".to_string()))
        );
        assert_eq!(b.mouse_shortcut(Button::Right, ModMask::empty()), None);
    }
}
