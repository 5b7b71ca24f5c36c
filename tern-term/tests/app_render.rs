//! What `App` draws, and when

mod common;

use std::time::{Duration, Instant};

use common::{cell_center, fixture, fixture_with, texts, Draw, StubFonts};
use tern_term::mouse::Button;
use tern_term::DisplayEventSink;

#[test]
fn test_row_is_drawn_in_style_runs() {
    let mut f = fixture(10, 2);
    let draws = f.frame(|app| {
        app.feed(b"abcde\x1b[1mf\x1b[mghij");
        app.redraw();
    });

    let texts: Vec<String> = texts(&draws).into_iter().map(|(_, t)| t).collect();
    // Three runs for the row, then the old cursor cell and the cursor
    assert_eq!(texts, vec!["abcde", "f", "ghij", "a", "j"]);
    assert_eq!(draws.last(), Some(&Draw::Commit));
}

#[test]
fn test_wide_char_is_drawn_alone() {
    let mut f = fixture(10, 2);
    let draws = f.frame(|app| {
        app.feed("a\u{4e2d}b".as_bytes());
        app.redraw();
    });

    let texts: Vec<String> = texts(&draws).into_iter().map(|(_, t)| t).collect();
    assert_eq!(texts[..3], ["a", "\u{4e2d}", "b      "]);
}

#[test]
fn test_one_frame_in_flight() {
    let mut f = fixture(10, 2);
    let base = f.app.canvas().commits();

    f.app.feed(b"x");
    f.app.redraw();
    assert_eq!(f.app.canvas().commits(), base + 1);
    assert!(f.app.pacer().is_pending());

    // Requested while the compositor holds the frame
    f.app.feed(b"y");
    f.app.redraw();
    assert_eq!(f.app.canvas().commits(), base + 1);

    f.app.on_frame_complete();
    assert_eq!(f.app.canvas().commits(), base + 2);

    // Nothing new to show
    f.app.on_frame_complete();
    f.app.redraw();
    assert_eq!(f.app.canvas().commits(), base + 2);
}

#[test]
fn test_hidden_surface_waits() {
    let mut f = fixture(10, 2);
    let base = f.app.canvas().commits();
    f.app.on_surface_enter();
    f.app.on_surface_leave();
    assert!(!f.app.pacer().is_visible());

    f.app.feed(b"x");
    f.app.redraw();
    assert_eq!(f.app.canvas().commits(), base);

    f.app.on_surface_enter();
    f.app.redraw();
    assert_eq!(f.app.canvas().commits(), base + 1);
}

#[test]
fn test_missing_glyph_uses_fallback_once() {
    let fonts = StubFonts {
        missing: vec!['\u{3bb}'],
        fallback_has: vec!['\u{3bb}'],
        ..StubFonts::default()
    };
    let mut f = fixture_with(10, 3, fonts);
    let draws = f.frame(|app| {
        app.feed("a\u{3bb}b".as_bytes());
        app.redraw();
    });

    let first = texts(&draws);
    assert_eq!(first[0], ("main", "a".to_string()));
    assert_eq!(first[1], ("fallback", "\u{3bb}".to_string()));
    assert_eq!(first[2], ("main", "b       ".to_string()));

    let draws = f.frame(|app| {
        app.on_frame_complete();
        app.feed("\r\n\u{3bb}".as_bytes());
        app.redraw();
    });
    assert!(texts(&draws).contains(&("fallback", "\u{3bb}".to_string())));
    assert_eq!(*f.fallback_calls.borrow(), vec!['\u{3bb}']);
}

#[test]
fn test_unavailable_glyph_is_searched_once() {
    let fonts = StubFonts {
        missing: vec!['\u{e000}'],
        ..StubFonts::default()
    };
    let mut f = fixture_with(10, 3, fonts);
    f.app.feed("\u{e000}".as_bytes());
    f.app.redraw();
    f.app.on_frame_complete();
    f.app.feed("\r\n\u{e000}".as_bytes());
    f.app.redraw();

    assert_eq!(*f.fallback_calls.borrow(), vec!['\u{e000}']);
    assert!(texts(&f.app.canvas().draws)
        .iter()
        .all(|(_, t)| !t.contains('\u{e000}')));
}

#[test]
fn test_damage_per_band_of_rows() {
    let mut f = fixture(10, 8);
    let before = f.app.canvas().damages().len();
    f.app.feed(b"\x1b[2;1Hx\x1b[3;1Hy\x1b[6;1Hz");
    f.app.redraw();

    let damages = f.app.canvas().damages()[before..].to_vec();
    let width = 2 * 2 + 10 * 7;
    assert_eq!(damages[0], (0, 16, width, 28));
    assert_eq!(damages[1], (0, 72, width, 14));
}

#[test]
fn test_selection_is_drawn_reversed() {
    let mut f = fixture(12, 2);
    f.app.feed(b"hello world");
    f.app.redraw();
    f.app.on_frame_complete();

    let draws = f.frame(|app| {
        let (x, y) = cell_center(0, 0);
        app.on_pointer_motion(x, y);
        app.on_pointer_button(Button::Left, true);
        let (x, y) = cell_center(4, 0);
        app.on_pointer_motion(x, y);
        app.on_pointer_button(Button::Left, false);
        app.redraw();
    });

    let texts: Vec<&str> = draws
        .iter()
        .filter_map(|d| match d {
            Draw::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts[..2], ["hello", " world "]);
    assert!(draws.contains(&Draw::Fill {
        x: 2,
        y: 2,
        w: 35,
        h: 14,
        color: 0xe5e5e5,
    }));
}

#[test]
fn test_blink_redraws_blinking_rows() {
    let mut f = fixture(10, 2);
    f.app.feed(b"\x1b[5mX\x1b[m");
    f.app.redraw();
    f.app.on_frame_complete();
    let base = f.app.canvas().commits();

    let now = Instant::now();
    let timeout = f.app.timeout(now).expect("blink timer armed");
    assert!(timeout <= Duration::from_millis(800));

    f.app.tick(now + Duration::from_millis(900));
    f.app.redraw();
    assert_eq!(f.app.canvas().commits(), base + 1);

    // Nothing blinks any more
    f.app.feed(b"\x1b[H ");
    assert_eq!(f.app.timeout(Instant::now()), None);
}

fn fill(x: i32, y: i32, w: i32, h: i32) -> Draw {
    Draw::Fill {
        x,
        y,
        w,
        h,
        color: 0x000000,
    }
}

#[test]
fn test_edge_runs_clear_the_border() {
    // 10x4 cells in a 74x60 window with a 2 px border
    let mut f = fixture(10, 4);
    let draws = f.frame(|app| {
        app.feed(b"\x1b[1;1Ha\x1b[4;10Hz");
        app.redraw();
    });

    // First row: left, right and top padding, then the cells
    assert!(draws.contains(&fill(0, 0, 2, 16)));
    assert!(draws.contains(&fill(72, 0, 2, 16)));
    assert!(draws.contains(&fill(2, 0, 70, 2)));
    assert!(draws.contains(&fill(2, 2, 70, 14)));

    // Last row: the side strips reach the window bottom
    assert!(draws.contains(&fill(0, 44, 2, 16)));
    assert!(draws.contains(&fill(72, 44, 2, 16)));
    assert!(draws.contains(&fill(2, 58, 70, 2)));
    assert!(draws.contains(&fill(2, 44, 70, 14)));
}

#[test]
fn test_inner_run_leaves_border_alone() {
    let mut f = fixture(10, 4);
    let draws = f.frame(|app| {
        app.feed(b"\x1b[2;4H\x1b[1mX\x1b[m");
        app.redraw();
    });

    let at = draws
        .iter()
        .position(|d| matches!(d, Draw::Text { text, .. } if text == "X"))
        .expect("bold run drawn");
    let start = draws[..at]
        .iter()
        .rposition(|d| matches!(d, Draw::Text { .. }))
        .map_or(0, |i| i + 1);
    let fills: Vec<&Draw> = draws[start..at]
        .iter()
        .filter(|d| matches!(d, Draw::Fill { .. }))
        .collect();
    assert_eq!(fills, vec![&fill(23, 16, 7, 14)]);

    // The runs either side touch the left and right edges
    assert!(draws.contains(&fill(0, 16, 2, 14)));
    assert!(draws.contains(&fill(72, 16, 2, 14)));
}

#[test]
fn test_underline_follows_run_face() {
    let fonts = StubFonts {
        bold_ascent: Some(6),
        ..StubFonts::default()
    };
    let mut f = fixture_with(10, 2, fonts);
    let draws = f.frame(|app| {
        app.feed(b"\x1b[1;4mab");
        app.redraw();
    });

    let underline = |y| Draw::Fill {
        x: 2,
        y,
        w: 14,
        h: 1,
        color: 0xe5e5e5,
    };
    // Bold ascent 6, not the regular face's 11
    assert!(draws.contains(&underline(2 + 6 + 1)));
    assert!(!draws.contains(&underline(2 + 11 + 1)));
}
