//! Grid rendering
//!
//! Each frame repaints the dirty rows run by run, then the cursor:
//! - Every run gets its background filled, then its glyphs, then the
//!   underline and strike decorations.
//! - Glyphs the style face has are drawn in batches. A missing glyph goes
//!   through the fallback ring and is drawn on its own.
//! - Runs touching the grid edges also clear the border next to them.
//! - Damage is reported once per band of adjacent dirty rows.

mod canvas;
mod palette;
mod run;

use std::rc::Rc;

use tern_core::{Attr, Cell, TermMode};

pub use canvas::{char_columns, Canvas, PixelBuffer, TextRun};
pub use palette::{
    cube_level, ColorRef, Palette, CURSOR, DEFAULT_BASE, DEFAULT_BG, DEFAULT_FG, REVERSE_CURSOR,
};
pub use run::{row_runs, Run, RUN_BYTES};

use crate::damage::{bands, DamageTracker};
use crate::error::Result;
use crate::font::{Face, FaceMetrics, FallbackCache, FontProvider, FontSet, FontStyle};
use crate::model::TermModel;
use crate::selection::Selection;

/// The snowman drawn by cursor shape 7
const SNOWMAN: char = '\u{2603}';

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub border_px: u32,
    pub cw_scale: f32,
    pub ch_scale: f32,
    /// 0-2 block, 3-4 underline, 5-6 bar, 7 snowman
    pub cursor_shape: u8,
    pub cursor_thickness: u32,
    /// Bold text in colors 0-7 uses the bright variants
    pub bold_brightens: bool,
    /// Palette slot used when a face lacks the requested slant or weight
    pub bad_style_color: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            border_px: 2,
            cw_scale: 1.0,
            ch_scale: 1.0,
            cursor_shape: 2,
            cursor_thickness: 2,
            bold_brightens: true,
            bad_style_color: 11,
        }
    }
}

/// Window state a frame depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameState {
    /// Blinking text is currently hidden
    pub blink_on: bool,
    pub focused: bool,
}

/// Foreground and background of a run after every color rule
#[allow(clippy::too_many_arguments)]
pub fn resolve_colors(
    palette: &Palette,
    opts: &RenderOptions,
    attr: Attr,
    fg: ColorRef,
    bg: ColorRef,
    face: &FaceMetrics,
    reverse_video: bool,
    blink_on: bool,
) -> (u32, u32) {
    let bold = attr.contains(Attr::BOLD);
    let faint = attr.contains(Attr::FAINT);
    let mut fg = fg;

    if (attr.contains(Attr::ITALIC) && face.bad_slant) || (bold && face.bad_weight) {
        fg = ColorRef::Slot(opts.bad_style_color);
    }
    if opts.bold_brightens && bold && !faint {
        if let ColorRef::Slot(slot) = fg {
            if slot < 8 {
                fg = ColorRef::Slot(slot + 8);
            }
        }
    }

    let mut fg_px = palette.resolve(fg);
    let mut bg_px = palette.resolve(bg);

    if reverse_video {
        fg_px = if fg == ColorRef::Slot(DEFAULT_FG) {
            palette.get(DEFAULT_BG)
        } else {
            !fg_px & 0xffffff
        };
        bg_px = if bg == ColorRef::Slot(DEFAULT_BG) {
            palette.get(DEFAULT_FG)
        } else {
            !bg_px & 0xffffff
        };
    }

    if attr.contains(Attr::REVERSE) {
        std::mem::swap(&mut fg_px, &mut bg_px);
    }
    if faint && !bold {
        fg_px = (fg_px >> 1) & 0x7f7f7f;
    }
    if (attr.contains(Attr::BLINK) && blink_on) || attr.contains(Attr::INVISIBLE) {
        fg_px = bg_px;
    }
    (fg_px, bg_px)
}

/// Per-frame borrows shared by the drawing helpers
struct Pass<'a, 'p, F, C: ?Sized> {
    canvas: &'a mut C,
    provider: &'a mut (dyn FontProvider<F> + 'p),
    reverse_video: bool,
    blink_on: bool,
}

pub struct Renderer<F> {
    fonts: FontSet<F>,
    fallback: FallbackCache<F>,
    palette: Palette,
    opts: RenderOptions,
    cw: u32,
    ch: u32,
    /// Window size in pixels
    width: u32,
    height: u32,
    cols: usize,
    rows: usize,
}

impl<F: Face> Renderer<F> {
    pub fn new(fonts: FontSet<F>, palette: Palette, opts: RenderOptions) -> Self {
        let (cw, ch) = fonts.cell_size(opts.cw_scale, opts.ch_scale);
        Self {
            fonts,
            fallback: FallbackCache::new(),
            palette,
            opts,
            cw,
            ch,
            width: 0,
            height: 0,
            cols: 1,
            rows: 1,
        }
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cw, self.ch)
    }

    pub fn font_size(&self) -> f32 {
        self.fonts.size
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn fallback_cache(&self) -> &FallbackCache<F> {
        &self.fallback
    }

    /// Swap in fonts loaded at another size; cached fallbacks are dropped
    pub fn set_fonts(&mut self, fonts: FontSet<F>) {
        let (cw, ch) = fonts.cell_size(self.opts.cw_scale, self.opts.ch_scale);
        self.fonts = fonts;
        self.fallback.clear();
        self.cw = cw;
        self.ch = ch;
    }

    /// Grid that fits a window of this size, at least one cell each way
    pub fn grid_for_window(&self, width: u32, height: u32) -> (usize, usize) {
        let border = 2 * self.opts.border_px;
        let cols = width.saturating_sub(border) / self.cw;
        let rows = height.saturating_sub(border) / self.ch;
        (cols.max(1) as usize, rows.max(1) as usize)
    }

    pub fn set_geometry(&mut self, width: u32, height: u32, cols: usize, rows: usize) {
        self.width = width;
        self.height = height;
        self.cols = cols.max(1);
        self.rows = rows.max(1);
    }

    fn text_width(&self) -> i32 {
        (self.cols as i32 * self.cw as i32).max(1)
    }

    fn text_height(&self) -> i32 {
        (self.rows as i32 * self.ch as i32).max(1)
    }

    /// Cell under a window pixel, clamped to the grid
    pub fn pixel_to_cell(&self, x: f64, y: f64) -> (usize, usize) {
        let b = self.opts.border_px as f64;
        let x = (x - b).clamp(0.0, (self.text_width() - 1) as f64);
        let y = (y - b).clamp(0.0, (self.text_height() - 1) as f64);
        (
            x as usize / self.cw as usize,
            y as usize / self.ch as usize,
        )
    }

    /// Repaint dirty rows and the cursor, report damage, commit
    pub fn draw<M, C>(
        &mut self,
        model: &M,
        sel: &Selection,
        damage: &mut DamageTracker,
        state: FrameState,
        provider: &mut dyn FontProvider<F>,
        canvas: &mut C,
    ) -> Result<()>
    where
        M: TermModel + ?Sized,
        C: Canvas<F> + ?Sized,
    {
        let mode = model.mode();
        let alt = mode.contains(TermMode::ALTSCREEN);
        let mut pass = Pass {
            canvas,
            provider,
            reverse_video: mode.contains(TermMode::REVERSE),
            blink_on: state.blink_on,
        };

        let rows: Vec<usize> = damage
            .take()
            .into_iter()
            .filter(|&row| row < model.rows())
            .collect();
        for &row in &rows {
            for run in row_runs(model, row, |col| sel.is_selected(col, row, alt)) {
                let (fg, bg) = ColorRef::of_cell(&run.base);
                self.draw_run(&run, row, fg, bg, &mut pass);
            }
        }

        let last = model.rows().saturating_sub(1);
        let b = self.opts.border_px as i32;
        let ch = self.ch as i32;
        for (top, bot) in bands(&rows) {
            let y0 = if top == 0 { 0 } else { b + top as i32 * ch };
            let y1 = if bot == last {
                self.height as i32
            } else {
                b + (bot as i32 + 1) * ch
            };
            pass.canvas.damage(0, y0, self.width as i32, y1 - y0);
        }

        self.draw_cursor(model, sel, damage, state.focused, &mut pass);
        log::trace!("Frame: {} rows repainted", rows.len());
        pass.canvas.commit()
    }

    fn draw_run<C: Canvas<F> + ?Sized>(
        &mut self,
        run: &Run,
        row: usize,
        fg: ColorRef,
        bg: ColorRef,
        pass: &mut Pass<'_, '_, F, C>,
    ) {
        let attr = run.base.attr;
        let style = FontStyle::from_flags(attr.contains(Attr::BOLD), attr.contains(Attr::ITALIC));
        let face = Rc::clone(self.fonts.get(style));
        let (fg, bg) = resolve_colors(
            &self.palette,
            &self.opts,
            attr,
            fg,
            bg,
            face.metrics(),
            pass.reverse_video,
            pass.blink_on,
        );

        let b = self.opts.border_px as i32;
        let (cw, ch) = (self.cw as i32, self.ch as i32);
        let (w, h) = (self.width as i32, self.height as i32);
        let (tw, th) = (self.text_width(), self.text_height());
        let winx = b + run.col as i32 * cw;
        let winy = b + row as i32 * ch;
        let width = run.columns as i32 * cw;

        // Borders next to the run
        let clear = self.palette.get(if pass.reverse_video {
            DEFAULT_FG
        } else {
            DEFAULT_BG
        });
        let top = if row == 0 { 0 } else { winy };
        let bottom = if winy + ch >= b + th { h } else { winy + ch };
        let canvas = &mut *pass.canvas;
        if run.col == 0 {
            canvas.fill_rect(0, top, b, bottom - top, clear);
        }
        if winx + width >= b + tw {
            canvas.fill_rect(winx + width, top, w - (winx + width), bottom - top, clear);
        }
        if row == 0 {
            canvas.fill_rect(winx, 0, width, b, clear);
        }
        if winy + ch >= b + th {
            canvas.fill_rect(winx, winy + ch, width, h - (winy + ch), clear);
        }

        canvas.fill_rect(winx, winy, width, ch, bg);

        let one_at_a_time = face.metrics().width != cw;
        let baseline = winy + face.metrics().ascent;
        let mut xp = winx;
        let mut rest = run.text.as_str();
        while let Some(first) = rest.chars().next() {
            let mut end = 0;
            let mut columns = 0;
            for (i, c) in rest.char_indices() {
                if !face.has_glyph(c) {
                    break;
                }
                end = i + c.len_utf8();
                columns += char_columns(c);
                if one_at_a_time {
                    break;
                }
            }

            if end > 0 {
                let text = TextRun {
                    text: &rest[..end],
                    x: xp,
                    baseline,
                    cell_width: self.cw,
                };
                canvas.draw_text(&*face, &text, fg);
                xp += cw * columns as i32;
                rest = &rest[end..];
                continue;
            }

            let len = first.len_utf8();
            let size = self.fonts.size;
            let provider = &mut *pass.provider;
            let found = self
                .fallback
                .resolve(style, first, || provider.fallback(style, first, size));
            if let Some(font) = found {
                let text = TextRun {
                    text: &rest[..len],
                    x: xp,
                    baseline: winy + font.metrics().ascent,
                    cell_width: self.cw,
                };
                canvas.draw_text(&*font, &text, fg);
            }
            xp += cw * char_columns(first) as i32;
            rest = &rest[len..];
        }

        let ascent = face.metrics().ascent;
        if attr.contains(Attr::UNDERLINE) {
            canvas.fill_rect(winx, winy + ascent + 1, width, 1, fg);
        }
        if attr.contains(Attr::STRUCK) {
            canvas.fill_rect(winx, winy + 2 * ascent / 3, width, 1, fg);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell<C: Canvas<F> + ?Sized>(
        &mut self,
        cell: Cell,
        fg: ColorRef,
        bg: ColorRef,
        col: usize,
        row: usize,
        pass: &mut Pass<'_, '_, F, C>,
    ) {
        let run = Run {
            col,
            columns: if cell.attr.contains(Attr::WIDE) { 2 } else { 1 },
            base: cell,
            text: cell.c.to_string(),
        };
        self.draw_run(&run, row, fg, bg, pass);
    }

    fn draw_cursor<M, C>(
        &mut self,
        model: &M,
        sel: &Selection,
        damage: &mut DamageTracker,
        focused: bool,
        pass: &mut Pass<'_, '_, F, C>,
    ) where
        M: TermModel + ?Sized,
        C: Canvas<F> + ?Sized,
    {
        let (cols, rows) = (model.cols(), model.rows());
        if cols == 0 || rows == 0 {
            return;
        }
        let mode = model.mode();
        let alt = mode.contains(TermMode::ALTSCREEN);
        let step_off_dummy = |col: usize, row: usize| {
            if col > 0 && model.cell_at(col, row).attr.contains(Attr::WDUMMY) {
                col - 1
            } else {
                col
            }
        };

        let (cx, cy) = model.cursor_position();
        let (cx, cy) = (cx.min(cols - 1), cy.min(rows - 1));
        let cx = step_off_dummy(cx, cy);
        let (ox, oy) = damage.prev_cursor();
        let (ox, oy) = (ox.min(cols - 1), oy.min(rows - 1));
        let ox = step_off_dummy(ox, oy);

        let b = self.opts.border_px as i32;
        let (cw, ch) = (self.cw as i32, self.ch as i32);

        // Restore the cell under the old cursor
        let mut old = model.cell_at(ox, oy);
        if sel.is_selected(ox, oy, alt) {
            old.attr.toggle(Attr::REVERSE);
        }
        let (fg, bg) = ColorRef::of_cell(&old);
        self.draw_cell(old, fg, bg, ox, oy, pass);
        let old_width = if old.attr.contains(Attr::WIDE) { 2 } else { 1 };
        pass.canvas
            .damage(b + ox as i32 * cw, b + oy as i32 * ch, cw * old_width, ch);
        damage.set_prev_cursor(cx, cy);

        if mode.contains(TermMode::HIDE) {
            return;
        }

        let mut g = model.cell_at(cx, cy);
        g.attr &= Attr::BOLD | Attr::ITALIC | Attr::UNDERLINE | Attr::STRUCK | Attr::WIDE;
        let selected = sel.is_selected(cx, cy, alt);
        let fg;
        let bg;
        let draw_color;
        if mode.contains(TermMode::REVERSE) {
            g.attr |= Attr::REVERSE;
            bg = ColorRef::Slot(DEFAULT_FG);
            if selected {
                draw_color = self.palette.get(CURSOR);
                fg = ColorRef::Slot(REVERSE_CURSOR);
            } else {
                draw_color = self.palette.get(REVERSE_CURSOR);
                fg = ColorRef::Slot(CURSOR);
            }
        } else {
            if selected {
                fg = ColorRef::Slot(DEFAULT_FG);
                bg = ColorRef::Slot(REVERSE_CURSOR);
            } else {
                fg = ColorRef::Slot(DEFAULT_BG);
                bg = ColorRef::Slot(CURSOR);
            }
            draw_color = self.palette.resolve(bg);
        }

        let x = b + cx as i32 * cw;
        let y = b + cy as i32 * ch;
        let thickness = self.opts.cursor_thickness as i32;
        if focused {
            match self.opts.cursor_shape {
                3 | 4 => pass
                    .canvas
                    .fill_rect(x, y + ch - thickness, cw, thickness, draw_color),
                5 | 6 => pass.canvas.fill_rect(x, y, thickness, ch, draw_color),
                shape => {
                    if shape == 7 {
                        g.c = SNOWMAN;
                    }
                    self.draw_cell(g, fg, bg, cx, cy, pass);
                }
            }
        } else {
            let canvas = &mut *pass.canvas;
            canvas.fill_rect(x, y, cw - 1, 1, draw_color);
            canvas.fill_rect(x, y, 1, ch - 1, draw_color);
            canvas.fill_rect(x + cw - 1, y, 1, ch - 1, draw_color);
            canvas.fill_rect(x, y + ch - 1, cw, 1, draw_color);
        }
        pass.canvas.damage(x, y, cw, ch);
    }
}
