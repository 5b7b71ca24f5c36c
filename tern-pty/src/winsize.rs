//! Window size reported to the child

/// Grid size in cells plus the pixel size of the text area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub cols: u16,
    pub rows: u16,
    pub width_px: u16,
    pub height_px: u16,
}

impl WindowSize {
    pub fn new(cols: u16, rows: u16, width_px: u16, height_px: u16) -> Self {
        Self {
            cols,
            rows,
            width_px,
            height_px,
        }
    }

    pub(crate) fn as_winsize(&self) -> libc::winsize {
        libc::winsize {
            ws_row: self.rows,
            ws_col: self.cols,
            ws_xpixel: self.width_px,
            ws_ypixel: self.height_px,
        }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24, 0, 0)
    }
}
