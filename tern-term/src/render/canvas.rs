//! Drawing targets
//!
//! The renderer only fills rectangles, draws text in a given face and
//! reports damaged areas. [`Canvas`] is that surface; the window's
//! softbuffer surface implements it for real, tests record the calls.

use unicode_width::UnicodeWidthChar;

use crate::error::Result;

/// Characters drawn in one face, laid out on the cell grid
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub text: &'a str,
    /// Left edge of the first cell
    pub x: i32,
    pub baseline: i32,
    pub cell_width: u32,
}

impl TextRun<'_> {
    /// Left edges of every character, advancing by whole cells
    pub fn positions(&self) -> impl Iterator<Item = (char, i32)> + '_ {
        let cw = self.cell_width as i32;
        self.text.chars().scan(self.x, move |x, c| {
            let at = *x;
            *x += cw * char_columns(c) as i32;
            Some((c, at))
        })
    }
}

/// Columns a character occupies, at least one
pub fn char_columns(c: char) -> usize {
    c.width().unwrap_or(1).max(1)
}

pub trait Canvas<F> {
    /// Window size changed
    fn resize(&mut self, width: u32, height: u32);

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32);

    fn draw_text(&mut self, font: &F, run: &TextRun<'_>, color: u32);

    /// Mark an area as changed for the next commit
    fn damage(&mut self, x: i32, y: i32, w: i32, h: i32);

    /// Hand the frame to the display
    fn commit(&mut self) -> Result<()>;

    fn set_title(&mut self, _title: &str) {}
}

/// A CPU pixel buffer in 0x00RRGGBB
#[derive(Debug, Clone, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Resize, keeping what overlaps the old size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let mut pixels = vec![0; width as usize * height as usize];
        for y in 0..self.height.min(height) {
            let w = self.width.min(width) as usize;
            let src = (y * self.width) as usize;
            let dst = (y * width) as usize;
            pixels[dst..dst + w].copy_from_slice(&self.pixels[src..src + w]);
        }
        self.width = width;
        self.height = height;
        self.pixels = pixels;
    }

    /// Fill a rectangle, clipped to the buffer
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for py in y0..y1 {
            let row = (py as u32 * self.width) as usize;
            self.pixels[row + x0 as usize..row + x1 as usize].fill(color);
        }
    }

    /// Blend a coverage bitmap (one byte per pixel) in `color`
    pub fn blend(&mut self, x: i32, y: i32, w: usize, h: usize, coverage: &[u8], color: u32) {
        for dy in 0..h {
            let py = y + dy as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for dx in 0..w {
                let px = x + dx as i32;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }
                let alpha = coverage[dy * w + dx];
                if alpha == 0 {
                    continue;
                }
                let idx = (py as u32 * self.width + px as u32) as usize;
                self.pixels[idx] = if alpha == 255 {
                    color
                } else {
                    mix(self.pixels[idx], color, alpha)
                };
            }
        }
    }
}

/// Linear blend of `fg` over `bg` by `alpha`
fn mix(bg: u32, fg: u32, alpha: u8) -> u32 {
    let a = alpha as u32;
    let ia = 255 - a;
    let channel = |shift: u32| {
        let b = (bg >> shift) & 0xff;
        let f = (fg >> shift) & 0xff;
        ((f * a + b * ia) / 255) << shift
    };
    channel(16) | channel(8) | channel(0)
}
