//! Terminal grid - the visible screen area
//!
//! A grid is a fixed-size 2D array of cells plus a dirty bit per row. Every
//! mutation marks the touched rows; the renderer drains them with
//! [`Grid::take_dirty`].

use crate::cell::{Attr, Cell};

/// The terminal grid (visible screen area)
#[derive(Debug, Clone)]
pub struct Grid {
    /// Lines in the grid (row 0 is top)
    lines: Vec<Vec<Cell>>,
    dirty: Vec<bool>,
    cols: usize,
    rows: usize,
}

impl Grid {
    /// Create a blank grid with every row dirty
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            lines: vec![vec![Cell::default(); cols]; rows],
            dirty: vec![true; rows],
            cols,
            rows,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell at (col, row); both must be in range
    pub fn cell(&self, col: usize, row: usize) -> &Cell {
        &self.lines[row][col]
    }

    /// Mutable cell access; marks the row dirty
    pub fn cell_mut(&mut self, col: usize, row: usize) -> &mut Cell {
        self.dirty[row] = true;
        &mut self.lines[row][col]
    }

    pub fn line(&self, row: usize) -> &[Cell] {
        &self.lines[row]
    }

    /// Mark rows `top..=bot` dirty, clamped to the grid
    pub fn set_dirty(&mut self, top: usize, bot: usize) {
        let bot = bot.min(self.rows - 1);
        for row in top..=bot {
            self.dirty[row] = true;
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.iter_mut().for_each(|d| *d = true);
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.dirty.get(row).copied().unwrap_or(false)
    }

    /// Return the dirty rows in ascending order and clear their bits
    pub fn take_dirty(&mut self) -> Vec<usize> {
        let rows = self
            .dirty
            .iter()
            .enumerate()
            .filter_map(|(row, &d)| d.then_some(row))
            .collect();
        self.dirty.iter_mut().for_each(|d| *d = false);
        rows
    }

    /// Mark every row holding a cell with any of `attr` dirty
    pub fn set_dirty_attr(&mut self, attr: Attr) {
        for row in 0..self.rows {
            if self.lines[row].iter().any(|c| c.attr.intersects(attr)) {
                self.dirty[row] = true;
            }
        }
    }

    /// True if any cell on screen carries one of `attr`
    pub fn has_attr(&self, attr: Attr) -> bool {
        self.lines
            .iter()
            .any(|line| line.iter().any(|c| c.attr.intersects(attr)))
    }

    /// Length of a line ignoring trailing blanks, unless the line wraps
    pub fn line_len(&self, row: usize) -> usize {
        let line = &self.lines[row];
        if line[self.cols - 1].attr.contains(Attr::WRAP) {
            return self.cols;
        }
        let mut len = self.cols;
        while len > 0 && line[len - 1].c == ' ' {
            len -= 1;
        }
        len
    }

    /// Blank the rectangle between two corners, inclusive
    pub fn clear_region(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, template: &Cell) {
        let (x1, x2) = (x1.min(x2), x1.max(x2).min(self.cols - 1));
        let (y1, y2) = (y1.min(y2), y1.max(y2).min(self.rows - 1));
        for row in y1..=y2 {
            self.dirty[row] = true;
            for col in x1..=x2 {
                self.lines[row][col] = Cell::blank(template);
            }
        }
    }

    /// Scroll rows `top..=bot` up by `n`, blanking the bottom
    pub fn scroll_up(&mut self, top: usize, bot: usize, n: usize, template: &Cell) {
        if top > bot || bot >= self.rows {
            return;
        }
        let n = n.min(bot - top + 1);
        self.lines[top..=bot].rotate_left(n);
        for row in (bot + 1 - n)..=bot {
            self.lines[row].fill(Cell::blank(template));
        }
        self.set_dirty(top, bot);
    }

    /// Scroll rows `top..=bot` down by `n`, blanking the top
    pub fn scroll_down(&mut self, top: usize, bot: usize, n: usize, template: &Cell) {
        if top > bot || bot >= self.rows {
            return;
        }
        let n = n.min(bot - top + 1);
        self.lines[top..=bot].rotate_right(n);
        for row in top..top + n {
            self.lines[row].fill(Cell::blank(template));
        }
        self.set_dirty(top, bot);
    }

    /// Shift cells right from `col`, inserting `n` blanks
    pub fn insert_blanks(&mut self, col: usize, row: usize, n: usize, template: &Cell) {
        let n = n.min(self.cols - col);
        let line = &mut self.lines[row];
        line[col..].rotate_right(n);
        line[col..col + n].fill(Cell::blank(template));
        self.dirty[row] = true;
    }

    /// Remove `n` cells at `col`, pulling the rest of the line left
    pub fn delete_chars(&mut self, col: usize, row: usize, n: usize, template: &Cell) {
        let n = n.min(self.cols - col);
        let cols = self.cols;
        let line = &mut self.lines[row];
        line[col..].rotate_left(n);
        line[cols - n..].fill(Cell::blank(template));
        self.dirty[row] = true;
    }

    /// Resize, keeping the top-left content
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        self.lines.truncate(rows);
        for line in &mut self.lines {
            line.resize(cols, Cell::default());
        }
        self.lines.resize(rows, vec![Cell::default(); cols]);
        self.cols = cols;
        self.rows = rows;
        self.dirty = vec![true; rows];
    }
}
