//! Terminal state
//!
//! [`Term`] couples a `vte` parser with the screen state it drives. The
//! front end talks to it through a handful of calls: feed bytes, read cells,
//! drain dirty rows and pending replies, and resize.

use log::debug;
use unicode_width::UnicodeWidthChar;

use crate::cell::{Attr, Cell};
use crate::grid::Grid;
use crate::mode::TermMode;

const TAB_WIDTH: usize = 8;

/// Cursor position plus the attributes new characters are written with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub col: usize,
    pub row: usize,
    /// Template cell for newly written characters
    pub template: Cell,
    /// The last column was written; the next printable wraps first
    pub(crate) wrap_next: bool,
}

/// Screen state mutated by the escape interpreter
pub(crate) struct Screen {
    pub(crate) grid: Grid,
    /// The inactive buffer (primary while the alternate screen is shown)
    pub(crate) other: Grid,
    pub(crate) cursor: Cursor,
    /// Saved cursors for the primary and alternate screens
    pub(crate) saved: [Cursor; 2],
    pub(crate) mode: TermMode,
    pub(crate) top: usize,
    pub(crate) bot: usize,
    tabs: Vec<bool>,
    pub(crate) title: Option<String>,
    pub(crate) responses: Vec<u8>,
}

impl Screen {
    fn new(cols: usize, rows: usize) -> Self {
        let grid = Grid::new(cols, rows);
        let rows = grid.rows();
        let cols = grid.cols();
        Self {
            other: Grid::new(cols, rows),
            grid,
            cursor: Cursor::default(),
            saved: [Cursor::default(); 2],
            mode: TermMode::initial(),
            top: 0,
            bot: rows - 1,
            tabs: default_tabs(cols),
            title: None,
            responses: Vec::new(),
        }
    }

    pub(crate) fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub(crate) fn rows(&self) -> usize {
        self.grid.rows()
    }

    /// Full reset (RIS)
    pub(crate) fn reset(&mut self) {
        let (cols, rows) = (self.cols(), self.rows());
        let title = self.title.take();
        *self = Screen::new(cols, rows);
        self.title = title;
    }

    pub(crate) fn put_char(&mut self, c: char) {
        let width = match c.width() {
            Some(w) if w > 0 => w,
            _ => return,
        };
        let cols = self.cols();

        if self.mode.contains(TermMode::WRAP) && self.cursor.wrap_next {
            let (col, row) = (self.cursor.col, self.cursor.row);
            self.grid.cell_mut(col, row).attr.insert(Attr::WRAP);
            self.newline(true);
        }

        if self.mode.contains(TermMode::INSERT) && self.cursor.col + width < cols {
            let template = self.cursor.template;
            self.grid
                .insert_blanks(self.cursor.col, self.cursor.row, width, &template);
        }

        if self.cursor.col + width > cols {
            self.newline(true);
        }

        let (col, row) = (self.cursor.col, self.cursor.row);
        self.set_char(c, col, row);
        if width == 2 {
            self.grid.cell_mut(col, row).attr.insert(Attr::WIDE);
            if col + 1 < cols {
                let dummy = self.grid.cell_mut(col + 1, row);
                dummy.c = '\0';
                dummy.attr = Attr::WDUMMY;
            }
        }

        if col + width < cols {
            self.move_to(col + width, row);
        } else {
            self.cursor.wrap_next = true;
        }
    }

    /// Write one cell, breaking any wide pair it overlaps
    fn set_char(&mut self, c: char, col: usize, row: usize) {
        let cols = self.cols();
        let existing = *self.grid.cell(col, row);
        if existing.attr.contains(Attr::WIDE) && col + 1 < cols {
            let next = self.grid.cell_mut(col + 1, row);
            next.c = ' ';
            next.attr.remove(Attr::WDUMMY);
        } else if existing.attr.contains(Attr::WDUMMY) && col > 0 {
            let prev = self.grid.cell_mut(col - 1, row);
            prev.c = ' ';
            prev.attr.remove(Attr::WIDE);
        }

        let template = self.cursor.template;
        let cell = self.grid.cell_mut(col, row);
        *cell = template;
        cell.c = c;
    }

    pub(crate) fn newline(&mut self, first_col: bool) {
        let row = self.cursor.row;
        if row == self.bot {
            let template = self.cursor.template;
            self.grid.scroll_up(self.top, self.bot, 1, &template);
        } else if row + 1 < self.rows() {
            self.cursor.row += 1;
        }
        if first_col {
            self.cursor.col = 0;
        }
        self.cursor.wrap_next = false;
    }

    /// Reverse index: move up, scrolling the region down at the top margin
    pub(crate) fn reverse_index(&mut self) {
        if self.cursor.row == self.top {
            let template = self.cursor.template;
            self.grid.scroll_down(self.top, self.bot, 1, &template);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
        self.cursor.wrap_next = false;
    }

    pub(crate) fn move_to(&mut self, col: usize, row: usize) {
        let (min_row, max_row) = if self.mode.contains(TermMode::ORIGIN) {
            (self.top, self.bot)
        } else {
            (0, self.rows() - 1)
        };
        self.cursor.col = col.min(self.cols() - 1);
        self.cursor.row = row.clamp(min_row, max_row);
        self.cursor.wrap_next = false;
    }

    /// Absolute move honoring origin mode
    pub(crate) fn move_to_abs(&mut self, col: usize, row: usize) {
        let offset = if self.mode.contains(TermMode::ORIGIN) {
            self.top
        } else {
            0
        };
        self.move_to(col, row + offset);
    }

    pub(crate) fn move_relative(&mut self, dcol: isize, drow: isize) {
        let col = self.cursor.col.saturating_add_signed(dcol);
        let row = self.cursor.row.saturating_add_signed(drow);
        self.move_to(col, row);
    }

    pub(crate) fn tab(&mut self, forward: bool, count: usize) {
        let mut col = self.cursor.col;
        for _ in 0..count {
            if forward {
                col += 1;
                while col < self.cols() && !self.tabs[col] {
                    col += 1;
                }
            } else {
                col = col.saturating_sub(1);
                while col > 0 && !self.tabs[col] {
                    col -= 1;
                }
            }
        }
        let row = self.cursor.row;
        self.move_to(col, row);
    }

    pub(crate) fn set_tab(&mut self, on: bool) {
        let col = self.cursor.col;
        self.tabs[col] = on;
    }

    pub(crate) fn clear_all_tabs(&mut self) {
        self.tabs.iter_mut().for_each(|t| *t = false);
    }

    pub(crate) fn clear_region(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) {
        let template = self.cursor.template;
        self.grid.clear_region(x1, y1, x2, y2, &template);
    }

    /// ED: 0 below, 1 above, 2 all
    pub(crate) fn erase_display(&mut self, how: u16) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        let (last_col, last_row) = (self.cols() - 1, self.rows() - 1);
        match how {
            0 => {
                self.clear_region(col, row, last_col, row);
                if row < last_row {
                    self.clear_region(0, row + 1, last_col, last_row);
                }
            }
            1 => {
                if row > 0 {
                    self.clear_region(0, 0, last_col, row - 1);
                }
                self.clear_region(0, row, col, row);
            }
            2 | 3 => self.clear_region(0, 0, last_col, last_row),
            _ => debug!("Unknown ED mode: {}", how),
        }
    }

    /// EL: 0 right, 1 left, 2 whole line
    pub(crate) fn erase_line(&mut self, how: u16) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        let last_col = self.cols() - 1;
        match how {
            0 => self.clear_region(col, row, last_col, row),
            1 => self.clear_region(0, row, col, row),
            2 => self.clear_region(0, row, last_col, row),
            _ => debug!("Unknown EL mode: {}", how),
        }
    }

    pub(crate) fn insert_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if (self.top..=self.bot).contains(&row) {
            let template = self.cursor.template;
            self.grid.scroll_down(row, self.bot, n, &template);
        }
    }

    pub(crate) fn delete_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if (self.top..=self.bot).contains(&row) {
            let template = self.cursor.template;
            self.grid.scroll_up(row, self.bot, n, &template);
        }
    }

    pub(crate) fn scroll_region_up(&mut self, n: usize) {
        let template = self.cursor.template;
        self.grid.scroll_up(self.top, self.bot, n, &template);
    }

    pub(crate) fn scroll_region_down(&mut self, n: usize) {
        let template = self.cursor.template;
        self.grid.scroll_down(self.top, self.bot, n, &template);
    }

    pub(crate) fn insert_blanks(&mut self, n: usize) {
        let template = self.cursor.template;
        self.grid
            .insert_blanks(self.cursor.col, self.cursor.row, n, &template);
    }

    pub(crate) fn delete_chars(&mut self, n: usize) {
        let template = self.cursor.template;
        self.grid
            .delete_chars(self.cursor.col, self.cursor.row, n, &template);
    }

    pub(crate) fn erase_chars(&mut self, n: usize) {
        let (col, row) = (self.cursor.col, self.cursor.row);
        let last = (col + n.max(1) - 1).min(self.cols() - 1);
        self.clear_region(col, row, last, row);
    }

    /// DECSTBM; 1-based inclusive bounds already converted to 0-based
    pub(crate) fn set_scroll_region(&mut self, top: usize, bot: usize) {
        let last = self.rows() - 1;
        let top = top.min(last);
        let bot = bot.min(last);
        if top >= bot {
            return;
        }
        self.top = top;
        self.bot = bot;
        self.move_to_abs(0, 0);
    }

    pub(crate) fn save_cursor(&mut self) {
        let slot = self.mode.contains(TermMode::ALTSCREEN) as usize;
        self.saved[slot] = self.cursor;
    }

    pub(crate) fn restore_cursor(&mut self) {
        let slot = self.mode.contains(TermMode::ALTSCREEN) as usize;
        let saved = self.saved[slot];
        self.cursor.template = saved.template;
        self.move_to(saved.col, saved.row);
    }

    /// Swap primary and alternate buffers
    pub(crate) fn swap_screen(&mut self) {
        std::mem::swap(&mut self.grid, &mut self.other);
        self.mode.toggle(TermMode::ALTSCREEN);
        self.grid.mark_all_dirty();
    }

    /// 47/1047/1049 handling
    pub(crate) fn set_alt_screen(&mut self, on: bool, save_cursor: bool, clear: bool) {
        if on == self.mode.contains(TermMode::ALTSCREEN) {
            return;
        }
        if on {
            if save_cursor {
                self.save_cursor();
            }
            self.swap_screen();
            if clear {
                let (cols, rows) = (self.cols(), self.rows());
                self.clear_region(0, 0, cols - 1, rows - 1);
            }
        } else {
            self.swap_screen();
            if save_cursor {
                self.restore_cursor();
            }
        }
    }

    /// Toggle reverse video; everything must be repainted
    pub(crate) fn set_reverse(&mut self, on: bool) {
        if self.mode.contains(TermMode::REVERSE) != on {
            self.mode.set(TermMode::REVERSE, on);
            self.grid.mark_all_dirty();
        }
    }

    pub(crate) fn respond(&mut self, bytes: &[u8]) {
        self.responses.extend_from_slice(bytes);
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        self.grid.resize(cols, rows);
        self.other.resize(cols, rows);
        let (cols, rows) = (self.grid.cols(), self.grid.rows());
        let old_tabs = self.tabs.len();
        self.tabs.resize(cols, false);
        for col in old_tabs..cols {
            self.tabs[col] = col % TAB_WIDTH == 0;
        }
        self.top = 0;
        self.bot = rows - 1;
        for saved in &mut self.saved {
            saved.col = saved.col.min(cols - 1);
            saved.row = saved.row.min(rows - 1);
        }
        let (col, row) = (self.cursor.col, self.cursor.row);
        self.move_to(col, row);
    }
}

fn default_tabs(cols: usize) -> Vec<bool> {
    (0..cols).map(|col| col > 0 && col % TAB_WIDTH == 0).collect()
}

/// The terminal model: escape interpreter plus screen state
pub struct Term {
    parser: vte::Parser,
    screen: Screen,
}

impl Term {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            parser: vte::Parser::new(),
            screen: Screen::new(cols, rows),
        }
    }

    /// Interpret bytes read from the child
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.advance(&mut self.screen, bytes);
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.screen.resize(cols, rows);
    }

    pub fn cols(&self) -> usize {
        self.screen.cols()
    }

    pub fn rows(&self) -> usize {
        self.screen.rows()
    }

    pub fn grid(&self) -> &Grid {
        &self.screen.grid
    }

    pub fn cell(&self, col: usize, row: usize) -> &Cell {
        self.screen.grid.cell(col, row)
    }

    pub fn cursor(&self) -> &Cursor {
        &self.screen.cursor
    }

    pub fn mode(&self) -> TermMode {
        self.screen.mode
    }

    /// Set or clear mode bits directly (used for locally toggled modes)
    pub fn set_mode(&mut self, mode: TermMode, on: bool) {
        if mode.contains(TermMode::REVERSE) {
            self.screen.set_reverse(on);
        }
        self.screen.mode.set(mode, on);
    }

    pub fn set_dirty(&mut self, top: usize, bot: usize) {
        self.screen.grid.set_dirty(top, bot);
    }

    pub fn mark_all_dirty(&mut self) {
        self.screen.grid.mark_all_dirty();
    }

    pub fn take_dirty(&mut self) -> Vec<usize> {
        self.screen.grid.take_dirty()
    }

    pub fn has_attr(&self, attr: Attr) -> bool {
        self.screen.grid.has_attr(attr)
    }

    pub fn set_dirty_attr(&mut self, attr: Attr) {
        self.screen.grid.set_dirty_attr(attr);
    }

    pub fn line_len(&self, row: usize) -> usize {
        self.screen.grid.line_len(row)
    }

    /// Bytes the terminal wants written back to the child (DSR, DA)
    pub fn take_responses(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.screen.responses)
    }

    /// Window title set by OSC 0/2, cleared once read
    pub fn take_title(&mut self) -> Option<String> {
        self.screen.title.take()
    }
}
