//! Rows waiting for a repaint and where the cursor was last drawn

#[derive(Debug, Clone)]
pub struct DamageTracker {
    dirty: Vec<bool>,
    /// Cell the cursor was drawn at in the last frame
    prev_cursor: (usize, usize),
}

impl DamageTracker {
    /// Every row starts dirty
    pub fn new(rows: usize) -> Self {
        Self {
            dirty: vec![true; rows],
            prev_cursor: (0, 0),
        }
    }

    pub fn rows(&self) -> usize {
        self.dirty.len()
    }

    /// New row count; everything is dirty afterwards
    pub fn resize(&mut self, rows: usize) {
        self.dirty = vec![true; rows];
        let (col, row) = self.prev_cursor;
        self.prev_cursor = (col, row.min(rows.saturating_sub(1)));
    }

    pub fn mark(&mut self, row: usize) {
        if let Some(d) = self.dirty.get_mut(row) {
            *d = true;
        }
    }

    /// Mark `top..=bot`, clamped to the grid
    pub fn mark_span(&mut self, top: usize, bot: usize) {
        for row in top..=bot.min(self.dirty.len().saturating_sub(1)) {
            self.dirty[row] = true;
        }
    }

    pub fn mark_rows(&mut self, rows: impl IntoIterator<Item = usize>) {
        for row in rows {
            self.mark(row);
        }
    }

    pub fn mark_all(&mut self) {
        self.dirty.fill(true);
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.dirty.get(row).copied().unwrap_or(false)
    }

    pub fn any(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    /// Dirty rows in order, clearing each one
    pub fn take(&mut self) -> Vec<usize> {
        let mut rows = Vec::new();
        for (row, d) in self.dirty.iter_mut().enumerate() {
            if std::mem::take(d) {
                rows.push(row);
            }
        }
        rows
    }

    pub fn prev_cursor(&self) -> (usize, usize) {
        self.prev_cursor
    }

    pub fn set_prev_cursor(&mut self, col: usize, row: usize) {
        self.prev_cursor = (col, row);
    }
}

/// Merge sorted rows into inclusive bands of adjacent rows
pub fn bands(rows: &[usize]) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for &row in rows {
        match out.last_mut() {
            Some((_, bot)) if *bot + 1 == row => *bot = row,
            _ => out.push((row, row)),
        }
    }
    out
}
