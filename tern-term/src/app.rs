//! Application state
//!
//! Ties the terminal model, the child's TTY, the renderer and the input
//! state machines together. [`App`] implements [`DisplayEventSink`]; the
//! event loop feeds it child output and timer ticks.

use std::time::{Duration, Instant};

use bitflags::bitflags;
use tern_core::{Attr, TermMode};
use tern_pty::{Pty, WindowSize};

use crate::bindings::{Action, Bindings};
use crate::clipboard::{ClipboardKind, ClipboardProvider, Ownership};
use crate::config::Config;
use crate::damage::DamageTracker;
use crate::error::Error;
use crate::event::{DisplayEventSink, KeyPress};
use crate::font::{Face, FontProvider};
use crate::input::{self, ModMask};
use crate::model::TermModel;
use crate::mouse::{Axis, Button, MouseReporter};
use crate::pacer::FramePacer;
use crate::render::{Canvas, FrameState, Renderer};
use crate::selection::{RowSpan, Selection, Snap};
use crate::timers::{self, Blink, KeyRepeat};

bitflags! {
    /// Window state that is not part of the terminal model
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WinMode: u8 {
        const FOCUSED = 1 << 0;
        const NUMLOCK = 1 << 1;
    }
}

/// The child's side of the conversation
pub trait Tty {
    fn write_all(&mut self, bytes: &[u8]) -> tern_pty::Result<()>;
    fn resize(&mut self, size: WindowSize) -> tern_pty::Result<()>;
    /// Hang up the child's process group
    fn hangup(&mut self) -> tern_pty::Result<()>;
}

impl Tty for Pty {
    fn write_all(&mut self, bytes: &[u8]) -> tern_pty::Result<()> {
        Pty::write_all(self, bytes)
    }

    fn resize(&mut self, size: WindowSize) -> tern_pty::Result<()> {
        Pty::resize(self, size)
    }

    fn hangup(&mut self) -> tern_pty::Result<()> {
        Pty::hangup(self)
    }
}

/// Click timing for selection snapping
#[derive(Debug, Clone, Copy)]
struct ClickTiming {
    double: Duration,
    triple: Duration,
}

pub struct App<M, F, C> {
    model: M,
    canvas: C,
    renderer: Renderer<F>,
    fonts: Box<dyn FontProvider<F>>,
    tty: Box<dyn Tty>,
    clipboard: Box<dyn ClipboardProvider>,
    bindings: Bindings,

    damage: DamageTracker,
    selection: Selection,
    reporter: MouseReporter,
    ownership: Ownership,
    blink: Blink,
    repeat: KeyRepeat,
    pacer: FramePacer,
    clicks: ClickTiming,

    mode: WinMode,
    mods: ModMask,
    /// Outputs the surface is shown on
    outputs: usize,
    closing: bool,
    error: Option<Error>,
}

impl<M, F, C> App<M, F, C>
where
    M: TermModel,
    F: Face,
    C: Canvas<F>,
{
    /// Fonts are already loaded into `renderer`; `fonts` serves zoom and
    /// fallback lookups
    pub fn new(
        model: M,
        canvas: C,
        renderer: Renderer<F>,
        fonts: Box<dyn FontProvider<F>>,
        tty: Box<dyn Tty>,
        clipboard: Box<dyn ClipboardProvider>,
        config: &Config,
    ) -> Self {
        let now = Instant::now();
        let timing = &config.timing;
        let rows = model.rows();
        Self {
            model,
            canvas,
            renderer,
            fonts,
            tty,
            clipboard,
            bindings: Bindings::default(),
            damage: DamageTracker::new(rows),
            selection: Selection::new(&config.word_delimiters),
            reporter: MouseReporter::new(),
            ownership: Ownership::default(),
            blink: Blink::new(timing.blink(), now),
            repeat: KeyRepeat::new(timing.key_repeat_delay(), timing.key_repeat_interval()),
            pacer: FramePacer::new(),
            clicks: ClickTiming {
                double: timing.double_click(),
                triple: timing.triple_click(),
            },
            mode: WinMode::FOCUSED | WinMode::NUMLOCK,
            mods: ModMask::empty(),
            outputs: 0,
            closing: false,
            error: None,
        }
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn renderer(&self) -> &Renderer<F> {
        &self.renderer
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn win_mode(&self) -> WinMode {
        self.mode
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// A fatal error raised inside an event handler
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Write to the child. Failures are logged; a dead child shows up as
    /// end of file on the next read.
    fn send(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Err(e) = self.tty.write_all(bytes) {
            log::warn!("Failed to write to child: {}", e);
        }
    }

    fn needdraw(&mut self) {
        self.pacer.request();
    }

    fn mark(&mut self, span: Option<RowSpan>) {
        if let Some((top, bot)) = span {
            self.damage.mark_span(top, bot);
            self.needdraw();
        }
    }

    fn mouse_mode(&self) -> bool {
        self.model.mode().intersects(TermMode::MOUSE)
    }

    fn forcing_selection(&self) -> bool {
        self.mods.intersects(self.bindings.force_sel_mod)
    }

    /// Output read from the child
    pub fn feed(&mut self, bytes: &[u8]) {
        let rows = self.model.feed(bytes);
        if !rows.is_empty() {
            self.damage.mark_rows(rows);
            self.needdraw();
        }

        let responses = self.model.take_responses();
        self.send(&responses);

        if let Some(title) = self.model.take_title() {
            self.canvas.set_title(&title);
        }

        self.blink.set_active(self.model.has_attr(Attr::BLINK));
    }

    /// How long the loop may sleep before a timer is due
    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        timers::earliest(self.blink.timeout(now), self.repeat.timeout(now))
    }

    /// Fire due timers
    pub fn tick(&mut self, now: Instant) {
        if self.blink.poll(now) {
            let rows = self.model.rows_with_attr(Attr::BLINK);
            self.damage.mark_rows(rows);
            self.needdraw();
        }
        if let Some(bytes) = self.repeat.poll(now) {
            self.send(&bytes);
        }
    }

    /// Draw if a frame is wanted and allowed
    pub fn redraw(&mut self) {
        if self.pacer.begin_frame() {
            self.draw();
        }
    }

    fn draw(&mut self) {
        let state = FrameState {
            blink_on: self.blink.phase(),
            focused: self.mode.contains(WinMode::FOCUSED),
        };
        let result = self.renderer.draw(
            &self.model,
            &self.selection,
            &mut self.damage,
            state,
            self.fonts.as_mut(),
            &mut self.canvas,
        );
        if let Err(e) = result {
            log::error!("Failed to present frame: {}", e);
            self.error = Some(e);
        }
    }

    /// Fit the grid to a window size and tell everyone about it
    fn cresize(&mut self, width: u32, height: u32) {
        let (cols, rows) = self.renderer.grid_for_window(width, height);
        let (cw, ch) = self.renderer.cell_size();

        self.model.resize(cols, rows);
        self.damage.resize(rows);
        self.renderer.set_geometry(width, height, cols, rows);
        self.canvas.resize(width, height);

        let size = WindowSize::new(
            clamp_u16(cols),
            clamp_u16(rows),
            clamp_u16(cols * cw as usize),
            clamp_u16(rows * ch as usize),
        );
        if let Err(e) = self.tty.resize(size) {
            log::warn!("Failed to resize child TTY: {}", e);
        }

        self.selection.clear();
        log::debug!("Resized to {}x{} cells ({}x{} px)", cols, rows, width, height);
        self.needdraw();
    }

    fn zoom(&mut self, delta: f32) {
        self.zoom_abs(self.renderer.font_size() + delta);
    }

    fn zoom_abs(&mut self, size: f32) {
        let size = size.max(1.0);
        match self.fonts.load(size) {
            Ok(fonts) => {
                self.renderer.set_fonts(fonts);
                let (width, height) = self.renderer.window_size();
                self.cresize(width, height);
                self.damage.mark_all();
            }
            Err(e) => log::error!("Keeping current fonts: {}", e),
        }
    }

    fn zoom_reset(&mut self) {
        let size = self.fonts.default_size();
        if size > 0.0 {
            self.zoom_abs(size);
        }
    }

    fn run_action(&mut self, action: &Action) {
        match action {
            Action::Zoom(delta) => self.zoom(*delta),
            Action::ZoomReset => self.zoom_reset(),
            Action::ClipCopy => self.clip_copy(),
            Action::ClipPaste => self.paste(ClipboardKind::Clipboard),
            Action::SelPaste => self.paste(ClipboardKind::Primary),
            Action::NumLock => self.mode.toggle(WinMode::NUMLOCK),
            Action::Send(s) => self.send(s.as_bytes()),
        }
    }

    /// Offer text and remember that we own it
    fn offer(&mut self, kind: ClipboardKind, text: String) {
        if self.clipboard.set_text(kind, &text) {
            self.ownership.own(kind, text);
        }
    }

    fn clip_copy(&mut self) {
        let text = self
            .ownership
            .owned(ClipboardKind::Primary)
            .map(str::to_string)
            .or_else(|| self.selection.text(&self.model));
        if let Some(text) = text {
            self.offer(ClipboardKind::Clipboard, text);
        }
    }

    fn paste(&mut self, kind: ClipboardKind) {
        let current = self.clipboard.get_text(kind);
        let local = self.ownership.owned(kind).map(str::to_string);
        let text = match (local, current) {
            (Some(local), Some(current)) if local != current => {
                self.on_selection_lost(kind);
                Some(current)
            }
            (Some(local), _) => Some(local),
            (None, current) => current,
        };
        match text {
            Some(text) => self.on_clipboard_offer(kind, &text),
            None => log::debug!("Nothing to paste from {:?}", kind),
        }
    }

    fn mouse_sel(&mut self, done: bool) {
        let (col, row) = self.reporter.pointer();
        let span = self.selection.extend(col, row, done, &self.model);
        self.mark(span);

        if done {
            if let Some(text) = self.selection.text(&self.model) {
                self.offer(ClipboardKind::Primary, text);
            }
        }
    }
}

fn clamp_u16(n: usize) -> u16 {
    n.min(u16::MAX as usize) as u16
}

impl<M, F, C> DisplayEventSink for App<M, F, C>
where
    M: TermModel,
    F: Face,
    C: Canvas<F>,
{
    fn on_key_press(&mut self, key: &KeyPress) {
        let mode = self.model.mode();
        if mode.contains(TermMode::KBDLOCK) {
            return;
        }

        if let Some(action) = self.bindings.shortcut(key.sym, self.mods).cloned() {
            self.run_action(&action);
            return;
        }

        let numlock = self.mode.contains(WinMode::NUMLOCK);
        let mapped = input::kmap(
            &self.bindings.keys,
            &self.bindings.mapped_keys,
            key.sym,
            self.mods,
            mode,
            numlock,
        );
        let bytes = match (mapped, key.text.as_deref()) {
            (Some(s), _) => s.as_bytes().to_vec(),
            (None, Some(text)) if !text.is_empty() => {
                input::compose(text, self.mods, mode.contains(TermMode::EIGHT_BIT))
            }
            _ => return,
        };

        self.repeat.press(bytes.clone(), key.key, Instant::now());
        self.send(&bytes);
    }

    fn on_key_release(&mut self, key: u32) {
        if self.model.mode().contains(TermMode::KBDLOCK) {
            return;
        }
        self.repeat.release(key);
    }

    fn on_modifiers(&mut self, mods: ModMask) {
        self.mods = mods;
    }

    fn on_repeat_info(&mut self, delay: Duration, interval: Duration) {
        self.repeat.set_timing(delay, interval);
    }

    fn on_pointer_enter(&mut self, x: f64, y: f64) {
        let (col, row) = self.renderer.pixel_to_cell(x, y);
        self.reporter.set_pointer(col, row);
    }

    fn on_pointer_motion(&mut self, x: f64, y: f64) {
        let (col, row) = self.renderer.pixel_to_cell(x, y);
        if self.mouse_mode() && !self.forcing_selection() {
            let mode = self.model.mode();
            if let Some(report) = self.reporter.motion(col, row, self.mods, mode) {
                self.send(&report);
            }
            return;
        }
        self.reporter.set_pointer(col, row);
        self.mouse_sel(false);
    }

    fn on_pointer_button(&mut self, button: Button, pressed: bool) {
        if self.mouse_mode() && !self.forcing_selection() {
            let mode = self.model.mode();
            if let Some(report) = self.reporter.button(button, pressed, self.mods, mode) {
                self.send(&report);
            }
            return;
        }

        if !pressed {
            match button {
                Button::Middle => self.paste(ClipboardKind::Primary),
                Button::Left => self.mouse_sel(true),
                _ => {}
            }
            return;
        }

        if let Some(action) = self.bindings.mouse_shortcut(button, self.mods).cloned() {
            self.run_action(&action);
            return;
        }

        if button == Button::Left {
            let snap = self
                .selection
                .click_snap(Instant::now(), self.clicks.double, self.clicks.triple);
            let ty = self
                .bindings
                .selection_type(self.mods - self.bindings.force_sel_mod);
            let (col, row) = self.reporter.pointer();
            let span = self.selection.start(col, row, ty, snap, &self.model);
            self.mark(span);
            if snap != Snap::None {
                log::trace!("Selection snaps to {:?}", snap);
            }
        }
    }

    fn on_pointer_axis(&mut self, axis: Axis, value: f64) {
        if self.mouse_mode() && !self.forcing_selection() {
            let mode = self.model.mode();
            if let Some(report) = self.reporter.axis(axis, value, self.mods, mode) {
                self.send(&report);
            }
            return;
        }
        if let Some(output) = self.bindings.axis_shortcut(axis, value, self.mods) {
            let output = output.as_bytes().to_vec();
            self.send(&output);
        }
    }

    fn on_focus_enter(&mut self) {
        self.mode.insert(WinMode::FOCUSED);
        if self.model.mode().contains(TermMode::FOCUS) {
            self.send(input::encode_focus(true));
        }
        self.needdraw();
    }

    fn on_focus_leave(&mut self) {
        self.mode.remove(WinMode::FOCUSED);
        if self.model.mode().contains(TermMode::FOCUS) {
            self.send(input::encode_focus(false));
        }
        self.needdraw();
        self.repeat.cancel();
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.renderer.window_size() {
            return;
        }
        self.cresize(width, height);
    }

    fn on_surface_enter(&mut self) {
        self.outputs += 1;
        self.pacer.set_visible(true);
    }

    fn on_surface_leave(&mut self) {
        self.outputs = self.outputs.saturating_sub(1);
        if self.outputs == 0 {
            self.pacer.set_visible(false);
        }
    }

    fn on_frame_complete(&mut self) {
        if self.pacer.frame_done() && self.pacer.begin_frame() {
            self.draw();
        }
    }

    fn on_clipboard_offer(&mut self, _kind: ClipboardKind, text: &str) {
        let bracketed = self.model.mode().contains(TermMode::BRCKTPASTE);
        let bytes = input::encode_paste(text, bracketed);
        self.send(&bytes);
    }

    fn on_selection_lost(&mut self, kind: ClipboardKind) {
        if self.ownership.release(kind) && kind == ClipboardKind::Primary {
            let span = self.selection.clear();
            self.mark(span);
        }
    }

    fn on_close(&mut self) {
        log::info!("Window closed, hanging up the child");
        if let Err(e) = self.tty.hangup() {
            log::warn!("Failed to hang up child: {}", e);
        }
        self.closing = true;
    }
}
