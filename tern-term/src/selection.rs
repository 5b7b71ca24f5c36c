//! Text selection
//!
//! A selection is started by a button press, grows while the pointer drags
//! and is finalized on release. The original begin/end points are kept in
//! click order; the normalized points are what highlighting and copying
//! use. Word and line snapping extend the normalized points outwards.
//!
//! Operations that change what is highlighted return the rows that need a
//! repaint as an inclusive `(top, bottom)` pair.

use std::time::{Duration, Instant};

use tern_core::{Attr, TermMode};

use crate::model::TermModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Idle,
    /// Pressed, nothing selected yet
    Empty,
    /// Something is selected and still being dragged
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionType {
    Regular,
    Rectangular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snap {
    None,
    Word,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub col: usize,
    pub row: usize,
}

impl Point {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Rows to repaint, inclusive
pub type RowSpan = (usize, usize);

#[derive(Debug, Clone)]
pub struct Selection {
    mode: SelectionMode,
    ty: SelectionType,
    snap: Snap,
    /// Original begin, `None` when nothing is selected
    ob: Option<Point>,
    /// Original end
    oe: Point,
    /// Normalized begin and end
    nb: Point,
    ne: Point,
    /// Alternate screen was active when the selection started
    alt: bool,
    last_click: Option<Instant>,
    prev_click: Option<Instant>,
    delimiters: String,
}

impl Selection {
    pub fn new(delimiters: &str) -> Self {
        Self {
            mode: SelectionMode::Idle,
            ty: SelectionType::Regular,
            snap: Snap::None,
            ob: None,
            oe: Point::default(),
            nb: Point::default(),
            ne: Point::default(),
            alt: false,
            last_click: None,
            prev_click: None,
            delimiters: delimiters.to_string(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selection_type(&self) -> SelectionType {
        self.ty
    }

    pub fn snap(&self) -> Snap {
        self.snap
    }

    /// Normalized bounds, if anything is selected
    pub fn bounds(&self) -> Option<(Point, Point)> {
        self.ob.map(|_| (self.nb, self.ne))
    }

    /// Record a press of the selecting button and decide how it snaps.
    ///
    /// A press within `triple` of the click before last snaps to lines,
    /// one within `double` of the last click snaps to words.
    pub fn click_snap(&mut self, now: Instant, double: Duration, triple: Duration) -> Snap {
        let within = |t: Option<Instant>, limit: Duration| {
            t.is_some_and(|t| now.saturating_duration_since(t) <= limit)
        };
        let snap = if within(self.prev_click, triple) {
            Snap::Line
        } else if within(self.last_click, double) {
            Snap::Word
        } else {
            Snap::None
        };
        self.prev_click = self.last_click;
        self.last_click = Some(now);
        snap
    }

    /// Begin a selection at a cell. The type holds until the next press.
    /// Clears any previous selection; the rows it covered are part of the
    /// returned span.
    pub fn start<M: TermModel + ?Sized>(
        &mut self,
        col: usize,
        row: usize,
        ty: SelectionType,
        snap: Snap,
        model: &M,
    ) -> Option<RowSpan> {
        let cleared = self.clear();

        self.mode = SelectionMode::Empty;
        self.ty = ty;
        self.alt = model.mode().contains(TermMode::ALTSCREEN);
        self.snap = snap;
        let p = Point::new(col, row);
        self.ob = Some(p);
        self.oe = p;
        self.normalize(model);
        if self.snap != Snap::None {
            self.mode = SelectionMode::Ready;
        }

        Some(merge(cleared, (self.nb.row, self.ne.row)))
    }

    /// Move the selection end. With `done` the selection is finalized; a
    /// selection that never became ready is dropped instead.
    pub fn extend<M: TermModel + ?Sized>(
        &mut self,
        col: usize,
        row: usize,
        done: bool,
        model: &M,
    ) -> Option<RowSpan> {
        let ob = self.ob?;
        if self.mode == SelectionMode::Idle {
            return None;
        }
        if done && self.mode == SelectionMode::Empty {
            return self.clear();
        }

        let p = Point::new(col, row);
        if self.mode == SelectionMode::Empty && self.snap == Snap::None && p == ob && !done {
            return None;
        }

        let (old_oe, old_span) = (self.oe, (self.nb.row, self.ne.row));
        let was_empty = self.mode == SelectionMode::Empty;
        self.oe = p;
        self.normalize(model);
        self.mode = if done {
            SelectionMode::Idle
        } else {
            SelectionMode::Ready
        };

        if old_oe != self.oe || was_empty {
            Some(merge(Some(old_span), (self.nb.row, self.ne.row)))
        } else {
            None
        }
    }

    /// Drop the selection; returns the rows that were highlighted
    pub fn clear(&mut self) -> Option<RowSpan> {
        self.ob?;
        self.mode = SelectionMode::Idle;
        self.ob = None;
        Some((self.nb.row, self.ne.row))
    }

    /// Whether a cell is highlighted, given the current screen buffer
    pub fn is_selected(&self, col: usize, row: usize, alt_screen: bool) -> bool {
        if self.mode == SelectionMode::Empty || self.ob.is_none() || self.alt != alt_screen {
            return false;
        }
        let rows = self.nb.row <= row && row <= self.ne.row;
        match self.ty {
            SelectionType::Rectangular => rows && self.nb.col <= col && col <= self.ne.col,
            SelectionType::Regular => {
                rows && (row != self.nb.row || col >= self.nb.col)
                    && (row != self.ne.row || col <= self.ne.col)
            }
        }
    }

    /// The selected text. Trailing blanks are dropped and rows end in a
    /// newline unless they wrap into the next one.
    pub fn text<M: TermModel + ?Sized>(&self, model: &M) -> Option<String> {
        self.ob?;
        let cols = model.cols();
        let mut out = String::new();

        for row in self.nb.row..=self.ne.row.min(model.rows().saturating_sub(1)) {
            let len = model.line_len(row);
            if len == 0 {
                out.push('\n');
                continue;
            }

            let (first, last_col) = match self.ty {
                SelectionType::Rectangular => (self.nb.col, self.ne.col),
                SelectionType::Regular => (
                    if row == self.nb.row { self.nb.col } else { 0 },
                    if row == self.ne.row { self.ne.col } else { cols - 1 },
                ),
            };

            // One past the last cell that is copied
            let mut end = last_col.min(len - 1) + 1;
            while end > first && model.cell_at(end - 1, row).c == ' ' {
                end -= 1;
            }
            for col in first..end {
                let cell = model.cell_at(col, row);
                if !cell.attr.contains(Attr::WDUMMY) {
                    out.push(cell.c);
                }
            }

            let wraps = end > 0 && model.cell_at(end - 1, row).attr.contains(Attr::WRAP);
            if (row < self.ne.row || last_col >= len)
                && (!wraps || self.ty == SelectionType::Rectangular)
            {
                out.push('\n');
            }
        }
        Some(out)
    }

    fn normalize<M: TermModel + ?Sized>(&mut self, model: &M) {
        let Some(ob) = self.ob else {
            return;
        };
        let oe = self.oe;

        if self.ty == SelectionType::Regular && ob.row != oe.row {
            let (first, second) = if ob.row < oe.row { (ob, oe) } else { (oe, ob) };
            self.nb.col = first.col;
            self.ne.col = second.col;
        } else {
            self.nb.col = ob.col.min(oe.col);
            self.ne.col = ob.col.max(oe.col);
        }
        self.nb.row = ob.row.min(oe.row);
        self.ne.row = ob.row.max(oe.row);

        self.nb = self.snap_point(self.nb, -1, model);
        self.ne = self.snap_point(self.ne, 1, model);

        if self.ty == SelectionType::Rectangular {
            return;
        }
        // Expand over line ends
        let len = model.line_len(self.nb.row);
        if len < self.nb.col {
            self.nb.col = len;
        }
        if model.line_len(self.ne.row) <= self.ne.col {
            self.ne.col = model.cols().saturating_sub(1);
        }
    }

    fn is_delim(&self, c: char) -> bool {
        c != '\0' && self.delimiters.contains(c)
    }

    fn snap_point<M: TermModel + ?Sized>(&self, p: Point, direction: isize, model: &M) -> Point {
        let cols = model.cols() as isize;
        let rows = model.rows() as isize;
        let wraps = |col: isize, row: isize| {
            model
                .cell_at(col as usize, row as usize)
                .attr
                .contains(Attr::WRAP)
        };

        match self.snap {
            Snap::None => p,
            Snap::Word => {
                let (mut x, mut y) = (p.col as isize, p.row as isize);
                let mut prev = model.cell_at(p.col, p.row);
                let mut prev_delim = self.is_delim(prev.c);
                loop {
                    let mut nx = x + direction;
                    let mut ny = y;
                    if !(0..cols).contains(&nx) {
                        ny += direction;
                        nx = (nx + cols) % cols;
                        if !(0..rows).contains(&ny) {
                            break;
                        }
                        let (xt, yt) = if direction > 0 { (x, y) } else { (nx, ny) };
                        if !wraps(xt, yt) {
                            break;
                        }
                    }
                    if nx >= model.line_len(ny as usize) as isize {
                        break;
                    }
                    let cell = model.cell_at(nx as usize, ny as usize);
                    let delim = self.is_delim(cell.c);
                    if !cell.attr.contains(Attr::WDUMMY)
                        && (delim != prev_delim || (delim && cell.c != prev.c))
                    {
                        break;
                    }
                    x = nx;
                    y = ny;
                    prev = cell;
                    prev_delim = delim;
                }
                Point::new(x as usize, y as usize)
            }
            Snap::Line => {
                let mut y = p.row as isize;
                let x = if direction < 0 { 0 } else { cols - 1 };
                if direction < 0 {
                    while y > 0 && wraps(cols - 1, y - 1) {
                        y -= 1;
                    }
                } else {
                    while y < rows - 1 && wraps(cols - 1, y) {
                        y += 1;
                    }
                }
                Point::new(x as usize, y as usize)
            }
        }
    }
}

fn merge(a: Option<RowSpan>, b: RowSpan) -> RowSpan {
    match a {
        Some((top, bot)) => (top.min(b.0), bot.max(b.1)),
        None => b,
    }
}
