//! Fonts as the renderer sees them
//!
//! A [`FontSet`] holds the four style faces loaded at one size. Faces only
//! need to answer two questions: whether they have a glyph, and what their
//! metrics are. Rasterization belongs to the canvas that draws them.

mod fallback;
mod system;

use std::rc::Rc;

pub use fallback::{FallbackCache, FALLBACK_CAPACITY};
pub use system::{LoadedFont, SystemFonts};

use crate::error::Result;

/// Metrics recorded when a face is loaded
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceMetrics {
    pub ascent: i32,
    pub descent: i32,
    /// Advance width of a single-column glyph
    pub width: i32,
    pub height: i32,
    /// An italic face was requested but an upright one was found
    pub bad_slant: bool,
    /// A bold face was requested but a regular one was found
    pub bad_weight: bool,
}

pub trait Face {
    fn has_glyph(&self, c: char) -> bool;
    fn metrics(&self) -> &FaceMetrics;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Italic and bold together win over either alone
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => FontStyle::BoldItalic,
            (false, true) => FontStyle::Italic,
            (true, false) => FontStyle::Bold,
            (false, false) => FontStyle::Regular,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

/// The four style faces at one size
#[derive(Debug)]
pub struct FontSet<F> {
    pub regular: Rc<F>,
    pub bold: Rc<F>,
    pub italic: Rc<F>,
    pub bold_italic: Rc<F>,
    /// Pixel size the set was loaded at
    pub size: f32,
}

impl<F> Clone for FontSet<F> {
    fn clone(&self) -> Self {
        Self {
            regular: Rc::clone(&self.regular),
            bold: Rc::clone(&self.bold),
            italic: Rc::clone(&self.italic),
            bold_italic: Rc::clone(&self.bold_italic),
            size: self.size,
        }
    }
}

impl<F: Face> FontSet<F> {
    pub fn get(&self, style: FontStyle) -> &Rc<F> {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }

    /// Cell size in pixels from the regular face, scaled
    pub fn cell_size(&self, cw_scale: f32, ch_scale: f32) -> (u32, u32) {
        let m = self.regular.metrics();
        let cw = (m.width as f32 * cw_scale).ceil().max(1.0) as u32;
        let ch = (m.height as f32 * ch_scale).ceil().max(1.0) as u32;
        (cw, ch)
    }
}

/// Where font sets and per-codepoint fallbacks come from
pub trait FontProvider<F: Face> {
    /// Load the four style faces at a pixel size
    fn load(&mut self, size: f32) -> Result<FontSet<F>>;

    /// Size used at startup and by zoom reset
    fn default_size(&self) -> f32;

    /// Search the system for a face of `style` at `size` that has `c`.
    /// Expensive; callers cache the answer.
    fn fallback(&mut self, style: FontStyle, c: char, size: f32) -> Option<Rc<F>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_flags() {
        assert_eq!(FontStyle::from_flags(true, true), FontStyle::BoldItalic);
        assert_eq!(FontStyle::from_flags(false, true), FontStyle::Italic);
        assert_eq!(FontStyle::from_flags(true, false), FontStyle::Bold);
        assert_eq!(FontStyle::from_flags(false, false), FontStyle::Regular);
        assert!(FontStyle::BoldItalic.is_bold() && FontStyle::BoldItalic.is_italic());
    }
}
