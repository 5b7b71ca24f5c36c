//! Keyboard, pointer and clipboard handling through `App`

mod common;

use std::time::{Duration, Instant};

use common::{cell_center, fixture, window_for};
use tern_term::clipboard::ClipboardKind;
use tern_term::input::{Keysym, ModMask};
use tern_term::mouse::{Axis, Button};
use tern_term::selection::SelectionType;
use tern_term::{DisplayEventSink, KeyPress, WinMode};

fn key(sym: Keysym, text: &str) -> KeyPress {
    KeyPress::new(30, sym).with_text(text)
}

#[test]
fn test_typed_text_reaches_child() {
    let mut f = fixture(20, 4);
    f.app.on_key_press(&key(Keysym::Char('a'), "a"));
    assert_eq!(f.written(), b"a");

    f.app.on_modifiers(ModMask::CTRL);
    f.app.on_key_press(&key(Keysym::Char('c'), "c"));
    assert_eq!(f.written(), b"\x03");

    f.app.on_modifiers(ModMask::ALT);
    f.app.on_key_press(&key(Keysym::Char('x'), "x"));
    assert_eq!(f.written(), b"\x1bx");
}

#[test]
fn test_cursor_keys_follow_application_mode() {
    let mut f = fixture(20, 4);
    f.app.on_key_press(&KeyPress::new(103, Keysym::Up));
    assert_eq!(f.written(), b"\x1b[A");

    f.app.feed(b"\x1b[?1h");
    f.app.on_key_press(&KeyPress::new(103, Keysym::Up));
    assert_eq!(f.written(), b"\x1bOA");
}

#[test]
fn test_keyboard_lock_drops_keys() {
    let mut f = fixture(20, 4);
    f.app.feed(b"\x1b[2h");
    f.app.on_key_press(&key(Keysym::Char('a'), "a"));
    assert!(f.written().is_empty());
}

#[test]
fn test_held_key_repeats_until_release() {
    let mut f = fixture(20, 4);
    let start = Instant::now();
    f.app.on_key_press(&key(Keysym::Char('z'), "z"));
    assert_eq!(f.written(), b"z");

    // Repeat waits for the delay
    f.app.tick(start);
    assert!(f.written().is_empty());
    assert!(f.app.timeout(start).is_some());

    f.app.tick(start + Duration::from_millis(450));
    assert_eq!(f.written(), b"z");

    // Releasing another key changes nothing
    f.app.on_key_release(31);
    f.app.tick(start + Duration::from_millis(500));
    assert_eq!(f.written(), b"z");

    f.app.on_key_release(30);
    f.app.tick(start + Duration::from_secs(2));
    assert!(f.written().is_empty());
}

#[test]
fn test_focus_loss_stops_repeat() {
    let mut f = fixture(20, 4);
    let start = Instant::now();
    f.app.on_key_press(&key(Keysym::Char('z'), "z"));
    f.written();
    f.app.on_focus_leave();
    f.app.tick(start + Duration::from_secs(1));
    assert!(f.written().is_empty());
}

#[test]
fn test_focus_reports() {
    let mut f = fixture(20, 4);
    f.app.on_focus_leave();
    assert!(f.written().is_empty());
    assert!(!f.app.win_mode().contains(WinMode::FOCUSED));

    f.app.feed(b"\x1b[?1004h");
    f.app.on_focus_enter();
    assert_eq!(f.written(), b"\x1b[I");
    f.app.on_focus_leave();
    assert_eq!(f.written(), b"\x1b[O");
}

#[test]
fn test_sgr_button_reports() {
    let mut f = fixture(20, 12);
    f.app.feed(b"\x1b[?1000h\x1b[?1006h");

    let (x, y) = cell_center(5, 10);
    f.app.on_pointer_motion(x, y);
    // Button tracking alone does not report motion
    assert!(f.written().is_empty());

    f.app.on_pointer_button(Button::Left, true);
    assert_eq!(f.written(), b"\x1b[<0;6;11M");
    f.app.on_pointer_button(Button::Left, false);
    assert_eq!(f.written(), b"\x1b[<0;6;11m");
}

#[test]
fn test_wheel_reports_or_scrolls() {
    let mut f = fixture(20, 12);
    let (x, y) = cell_center(5, 10);
    f.app.on_pointer_motion(x, y);

    f.app.on_pointer_axis(Axis::Vertical, 1.0);
    assert_eq!(f.written(), b"\x05");
    f.app.on_pointer_axis(Axis::Vertical, -1.0);
    assert_eq!(f.written(), b"\x19");

    f.app.feed(b"\x1b[?1000h\x1b[?1006h");
    f.app.on_pointer_motion(x, y);
    f.app.on_pointer_axis(Axis::Vertical, 1.0);
    assert_eq!(f.written(), b"\x1b[<69;6;11M");
    f.app.on_pointer_axis(Axis::Vertical, -1.0);
    assert_eq!(f.written(), b"\x1b[<68;6;11M");
}

fn drag(f: &mut common::Fixture, from: (u32, u32), to: (u32, u32)) {
    let (x, y) = cell_center(from.0, from.1);
    f.app.on_pointer_motion(x, y);
    f.app.on_pointer_button(Button::Left, true);
    let (x, y) = cell_center(to.0, to.1);
    f.app.on_pointer_motion(x, y);
    f.app.on_pointer_button(Button::Left, false);
}

#[test]
fn test_drag_selects_and_offers_primary() {
    let mut f = fixture(20, 4);
    f.app.feed(b"hello world");
    drag(&mut f, (0, 0), (4, 0));

    assert_eq!(f.clipboard.get(ClipboardKind::Primary).as_deref(), Some("hello"));
    assert_eq!(f.clipboard.get(ClipboardKind::Clipboard), None);
    assert!(f.written().is_empty());

    // Copy places the selection on the clipboard
    f.app.on_modifiers(ModMask::CTRL | ModMask::SHIFT);
    f.app.on_key_press(&key(Keysym::Char('C'), "C"));
    assert_eq!(f.clipboard.get(ClipboardKind::Clipboard).as_deref(), Some("hello"));
    assert!(f.written().is_empty());
}

#[test]
fn test_selection_type_is_fixed_at_press() {
    let mut f = fixture(20, 4);
    f.app.feed(b"abcd\r\nefgh");

    let (x, y) = cell_center(1, 0);
    f.app.on_pointer_motion(x, y);
    f.app.on_modifiers(ModMask::ALT);
    f.app.on_pointer_button(Button::Left, true);

    // Letting go of Alt mid-drag keeps the block shape
    f.app.on_modifiers(ModMask::empty());
    let (x, y) = cell_center(2, 1);
    f.app.on_pointer_motion(x, y);
    f.app.on_pointer_button(Button::Left, false);

    assert_eq!(f.app.selection().selection_type(), SelectionType::Rectangular);
    assert_eq!(f.clipboard.get(ClipboardKind::Primary).as_deref(), Some("bc\nfg"));
}

#[test]
fn test_click_without_drag_selects_nothing() {
    let mut f = fixture(20, 4);
    f.app.feed(b"hello world");
    drag(&mut f, (2, 0), (2, 0));
    assert!(f.app.selection().bounds().is_none());
    assert_eq!(f.clipboard.get(ClipboardKind::Primary), None);
}

#[test]
fn test_shift_forces_selection_in_mouse_mode() {
    let mut f = fixture(20, 4);
    f.app.feed(b"hello world\x1b[?1000h\x1b[?1006h");
    f.app.on_modifiers(ModMask::SHIFT);
    drag(&mut f, (6, 0), (10, 0));
    assert!(f.written().is_empty());
    assert_eq!(f.clipboard.get(ClipboardKind::Primary).as_deref(), Some("world"));
}

#[test]
fn test_paste_shortcuts() {
    let mut f = fixture(20, 4);
    f.clipboard.set(ClipboardKind::Clipboard, "one\ntwo");
    f.app.on_modifiers(ModMask::CTRL | ModMask::SHIFT);
    f.app.on_key_press(&key(Keysym::Char('V'), "V"));
    assert_eq!(f.written(), b"one\rtwo");

    f.app.feed(b"\x1b[?2004h");
    f.app.on_key_press(&key(Keysym::Char('V'), "V"));
    assert_eq!(f.written(), b"\x1b[200~one\rtwo\x1b[201~");
}

#[test]
fn test_middle_click_pastes_own_selection() {
    let mut f = fixture(20, 4);
    f.app.feed(b"hello world");
    drag(&mut f, (6, 0), (10, 0));
    f.app.on_pointer_button(Button::Middle, true);
    f.app.on_pointer_button(Button::Middle, false);
    assert_eq!(f.written(), b"world");
}

#[test]
fn test_losing_primary_clears_selection() {
    let mut f = fixture(20, 4);
    f.app.feed(b"hello world");
    drag(&mut f, (0, 0), (4, 0));
    assert!(f.app.selection().bounds().is_some());

    // Another client took the primary selection
    f.clipboard.set(ClipboardKind::Primary, "elsewhere");
    f.app.on_pointer_button(Button::Middle, false);
    assert_eq!(f.written(), b"elsewhere");
    assert!(f.app.selection().bounds().is_none());
}

#[test]
fn test_selection_lost_event() {
    let mut f = fixture(20, 4);
    f.app.feed(b"hello world");
    drag(&mut f, (0, 0), (4, 0));
    f.app.on_selection_lost(ClipboardKind::Primary);
    assert!(f.app.selection().bounds().is_none());
}

#[test]
fn test_zoom_reloads_fonts_and_resizes_child() {
    let mut f = fixture(20, 4);
    f.app.on_modifiers(ModMask::CTRL | ModMask::SHIFT);
    f.app.on_key_press(&KeyPress::new(104, Keysym::PageUp));

    assert_eq!(*f.loads.borrow(), vec![14.0, 15.0]);
    assert_eq!(f.app.renderer().cell_size(), (8, 15));

    let (w, h) = window_for(20, 4);
    let cols = (w - 4) / 8;
    let rows = (h - 4) / 15;
    let size = *f.tty.borrow().sizes.last().unwrap();
    assert_eq!((size.cols as u32, size.rows as u32), (cols, rows));
    assert!(f.written().is_empty());

    f.app.on_key_press(&KeyPress::new(102, Keysym::Home));
    assert_eq!(f.loads.borrow().last(), Some(&14.0));
    assert_eq!(f.app.renderer().cell_size(), (7, 14));
}

#[test]
fn test_resize_reaches_child_once() {
    let mut f = fixture(20, 4);
    let sizes = f.tty.borrow().sizes.len();
    let (w, h) = window_for(30, 6);
    f.app.on_resize(w, h);
    f.app.on_resize(w, h);
    f.app.on_resize(0, h);

    let tty = f.tty.borrow();
    assert_eq!(tty.sizes.len(), sizes + 1);
    let size = tty.sizes[sizes];
    assert_eq!((size.cols, size.rows), (30, 6));
    assert_eq!((size.width_px, size.height_px), (30 * 7, 6 * 14));
}

#[test]
fn test_numlock_shortcut_toggles() {
    let mut f = fixture(20, 4);
    assert!(f.app.win_mode().contains(WinMode::NUMLOCK));
    f.app.on_modifiers(ModMask::CTRL | ModMask::SHIFT);
    f.app.on_key_press(&KeyPress::new(69, Keysym::NumLock));
    assert!(!f.app.win_mode().contains(WinMode::NUMLOCK));
}

#[test]
fn test_replies_and_title_from_child_output() {
    let mut f = fixture(20, 4);
    f.app.feed(b"\x1b[6n");
    assert_eq!(f.written(), b"\x1b[1;1R");

    f.app.feed(b"\x1b]0;tern test\x07");
    assert_eq!(f.app.canvas().title.as_deref(), Some("tern test"));
}

#[test]
fn test_close_hangs_up_child() {
    let mut f = fixture(20, 4);
    f.app.on_close();
    assert!(f.app.is_closing());
    assert_eq!(f.tty.borrow().hangups, 1);
}
