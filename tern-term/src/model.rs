//! The terminal model seen from the display side
//!
//! Rendering, selection and input only need a narrow view of the screen:
//! cells, the cursor, mode bits and the rows that changed. [`TermModel`]
//! is that view; [`tern_core::Term`] is the production implementation.

use tern_core::{Attr, Cell, Term, TermMode};

pub trait TermModel {
    fn cols(&self) -> usize;
    fn rows(&self) -> usize;
    fn resize(&mut self, cols: usize, rows: usize);

    /// Interpret child output; returns the rows it changed
    fn feed(&mut self, bytes: &[u8]) -> Vec<usize>;

    fn cell_at(&self, col: usize, row: usize) -> Cell;
    fn cursor_position(&self) -> (usize, usize);
    fn mode(&self) -> TermMode;

    /// Replies owed to the child (status reports, device attributes)
    fn take_responses(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn take_title(&mut self) -> Option<String> {
        None
    }

    /// Rows holding at least one cell with `attr`
    fn rows_with_attr(&self, attr: Attr) -> Vec<usize> {
        (0..self.rows())
            .filter(|&row| (0..self.cols()).any(|col| self.cell_at(col, row).attr.contains(attr)))
            .collect()
    }

    fn has_attr(&self, attr: Attr) -> bool {
        !self.rows_with_attr(attr).is_empty()
    }

    /// Length of a line for selection purposes: trailing blanks are not
    /// counted unless the line wraps into the next one
    fn line_len(&self, row: usize) -> usize {
        let cols = self.cols();
        if cols == 0 {
            return 0;
        }
        if self.cell_at(cols - 1, row).attr.contains(Attr::WRAP) {
            return cols;
        }
        let mut len = cols;
        while len > 0 && self.cell_at(len - 1, row).c == ' ' {
            len -= 1;
        }
        len
    }
}

impl TermModel for Term {
    fn cols(&self) -> usize {
        Term::cols(self)
    }

    fn rows(&self) -> usize {
        Term::rows(self)
    }

    fn resize(&mut self, cols: usize, rows: usize) {
        Term::resize(self, cols, rows);
    }

    fn feed(&mut self, bytes: &[u8]) -> Vec<usize> {
        Term::feed(self, bytes);
        self.take_dirty()
    }

    fn cell_at(&self, col: usize, row: usize) -> Cell {
        *self.cell(col, row)
    }

    fn cursor_position(&self) -> (usize, usize) {
        let cursor = self.cursor();
        (cursor.col, cursor.row)
    }

    fn mode(&self) -> TermMode {
        Term::mode(self)
    }

    fn take_responses(&mut self) -> Vec<u8> {
        Term::take_responses(self)
    }

    fn take_title(&mut self) -> Option<String> {
        Term::take_title(self)
    }

    fn has_attr(&self, attr: Attr) -> bool {
        Term::has_attr(self, attr)
    }

    fn line_len(&self, row: usize) -> usize {
        Term::line_len(self, row)
    }
}
