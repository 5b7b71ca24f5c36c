//! Shared fixtures: stub fonts, a recording canvas and TTY, and an `App`
//! wired to them

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tern_core::Term;
use tern_pty::WindowSize;
use tern_term::clipboard::{ClipboardKind, ClipboardProvider, MemoryClipboard};
use tern_term::config::Config;
use tern_term::font::{Face, FaceMetrics, FontProvider, FontSet, FontStyle};
use tern_term::render::{Canvas, Renderer, TextRun};
use tern_term::{App, DisplayEventSink, Tty};

/// A face that lacks the listed characters
#[derive(Debug)]
pub struct StubFace {
    pub name: &'static str,
    pub metrics: FaceMetrics,
    pub missing: Vec<char>,
}

impl StubFace {
    pub fn new(name: &'static str, size: f32, missing: &[char]) -> Self {
        let height = size.ceil() as i32;
        Self {
            name,
            metrics: FaceMetrics {
                ascent: height - height / 4,
                descent: height / 4,
                width: (size / 2.0).ceil() as i32,
                height,
                ..FaceMetrics::default()
            },
            missing: missing.to_vec(),
        }
    }
}

impl Face for StubFace {
    fn has_glyph(&self, c: char) -> bool {
        !self.missing.contains(&c)
    }

    fn metrics(&self) -> &FaceMetrics {
        &self.metrics
    }
}

/// Serves stub faces; the fallback face covers `fallback_has`
#[derive(Debug, Default)]
pub struct StubFonts {
    pub missing: Vec<char>,
    pub fallback_has: Vec<char>,
    /// Ascent of the bold faces, when it differs from the regular one
    pub bold_ascent: Option<i32>,
    pub loads: Rc<RefCell<Vec<f32>>>,
    pub fallback_calls: Rc<RefCell<Vec<char>>>,
}

impl FontProvider<StubFace> for StubFonts {
    fn load(&mut self, size: f32) -> tern_term::Result<FontSet<StubFace>> {
        self.loads.borrow_mut().push(size);
        let face = || Rc::new(StubFace::new("main", size, &self.missing));
        let bold = || {
            let mut face = StubFace::new("main", size, &self.missing);
            if let Some(ascent) = self.bold_ascent {
                face.metrics.ascent = ascent;
            }
            Rc::new(face)
        };
        Ok(FontSet {
            regular: face(),
            bold: bold(),
            italic: face(),
            bold_italic: bold(),
            size,
        })
    }

    fn default_size(&self) -> f32 {
        14.0
    }

    fn fallback(&mut self, _style: FontStyle, c: char, size: f32) -> Option<Rc<StubFace>> {
        self.fallback_calls.borrow_mut().push(c);
        self.fallback_has
            .contains(&c)
            .then(|| Rc::new(StubFace::new("fallback", size, &[])))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    Fill {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: u32,
    },
    Text {
        face: &'static str,
        text: String,
        x: i32,
        color: u32,
    },
    Damage {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    },
    Commit,
}

/// Text of every draw_text call, with the face it used
pub fn texts(draws: &[Draw]) -> Vec<(&'static str, String)> {
    draws
        .iter()
        .filter_map(|d| match d {
            Draw::Text { face, text, .. } => Some((*face, text.clone())),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub draws: Vec<Draw>,
    pub size: (u32, u32),
    pub title: Option<String>,
}

impl RecordingCanvas {
    pub fn commits(&self) -> usize {
        self.draws.iter().filter(|d| **d == Draw::Commit).count()
    }

    pub fn damages(&self) -> Vec<(i32, i32, i32, i32)> {
        self.draws
            .iter()
            .filter_map(|d| match *d {
                Draw::Damage { x, y, w, h } => Some((x, y, w, h)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas<StubFace> for RecordingCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.draws.push(Draw::Fill { x, y, w, h, color });
    }

    fn draw_text(&mut self, font: &StubFace, run: &TextRun<'_>, color: u32) {
        self.draws.push(Draw::Text {
            face: font.name,
            text: run.text.to_string(),
            x: run.x,
            color,
        });
    }

    fn damage(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.draws.push(Draw::Damage { x, y, w, h });
    }

    fn commit(&mut self) -> tern_term::Result<()> {
        self.draws.push(Draw::Commit);
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingTty {
    pub written: Vec<u8>,
    pub sizes: Vec<WindowSize>,
    pub hangups: usize,
}

impl RecordingTty {
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl Tty for RecordingTty {
    fn write_all(&mut self, bytes: &[u8]) -> tern_pty::Result<()> {
        self.written.extend_from_slice(bytes);
        Ok(())
    }

    fn resize(&mut self, size: WindowSize) -> tern_pty::Result<()> {
        self.sizes.push(size);
        Ok(())
    }

    fn hangup(&mut self) -> tern_pty::Result<()> {
        self.hangups += 1;
        Ok(())
    }
}

/// A memory clipboard the test can inspect while the app owns a handle
#[derive(Debug, Clone, Default)]
pub struct SharedClipboard(pub Rc<RefCell<MemoryClipboard>>);

impl SharedClipboard {
    pub fn get(&self, kind: ClipboardKind) -> Option<String> {
        self.0.borrow_mut().get_text(kind)
    }

    pub fn set(&self, kind: ClipboardKind, text: &str) {
        self.0.borrow_mut().set_text(kind, text);
    }
}

impl ClipboardProvider for SharedClipboard {
    fn set_text(&mut self, kind: ClipboardKind, text: &str) -> bool {
        self.0.borrow_mut().set_text(kind, text)
    }

    fn get_text(&mut self, kind: ClipboardKind) -> Option<String> {
        self.0.borrow_mut().get_text(kind)
    }
}

pub type TestApp = App<Term, StubFace, RecordingCanvas>;

pub struct Fixture {
    pub app: TestApp,
    pub tty: Rc<RefCell<RecordingTty>>,
    pub clipboard: SharedClipboard,
    pub loads: Rc<RefCell<Vec<f32>>>,
    pub fallback_calls: Rc<RefCell<Vec<char>>>,
}

/// Border of the default config
pub const BORDER: u32 = 2;
/// Cell size of stub faces at the default 14px
pub const CW: u32 = 7;
pub const CH: u32 = 14;

pub fn window_for(cols: u32, rows: u32) -> (u32, u32) {
    (2 * BORDER + cols * CW, 2 * BORDER + rows * CH)
}

/// Window center of a cell
pub fn cell_center(col: u32, row: u32) -> (f64, f64) {
    (
        (BORDER + col * CW + CW / 2) as f64,
        (BORDER + row * CH + CH / 2) as f64,
    )
}

pub fn fixture_with(cols: usize, rows: usize, fonts: StubFonts) -> Fixture {
    let config = Config::default();
    let mut fonts = fonts;
    let loads = fonts.loads.clone();
    let fallback_calls = fonts.fallback_calls.clone();
    let faces = fonts.load(config.font.size).expect("stub fonts load");
    let renderer = Renderer::new(faces, config.colors.palette(), config.render_options());

    let tty = Rc::new(RefCell::new(RecordingTty::default()));
    let clipboard = SharedClipboard::default();
    let mut app = App::new(
        Term::new(cols, rows),
        RecordingCanvas::default(),
        renderer,
        Box::new(fonts),
        Box::new(tty.clone()),
        Box::new(clipboard.clone()),
        &config,
    );

    let (w, h) = window_for(cols as u32, rows as u32);
    app.on_resize(w, h);
    app.redraw();
    app.on_frame_complete();
    tty.borrow_mut().take();

    Fixture {
        app,
        tty,
        clipboard,
        loads,
        fallback_calls,
    }
}

pub fn fixture(cols: usize, rows: usize) -> Fixture {
    fixture_with(cols, rows, StubFonts::default())
}

impl Fixture {
    pub fn written(&self) -> Vec<u8> {
        self.tty.borrow_mut().take()
    }

    /// Draw calls of the frames produced by `f`
    pub fn frame(&mut self, f: impl FnOnce(&mut TestApp)) -> Vec<Draw> {
        let before = self.app.canvas().draws.len();
        f(&mut self.app);
        self.app.canvas().draws[before..].to_vec()
    }
}
