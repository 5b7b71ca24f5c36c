//! Terminal cell representation
//!
//! A cell is a plain `Copy` value: one codepoint, a set of attribute bits
//! and two colors. The front end reads snapshots of these per draw call.

use bitflags::bitflags;

use crate::color::Color;

bitflags! {
    /// Attribute bits of a cell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u16 {
        const BOLD       = 1 << 0;
        const FAINT      = 1 << 1;
        const ITALIC     = 1 << 2;
        const UNDERLINE  = 1 << 3;
        const BLINK      = 1 << 4;
        const REVERSE    = 1 << 5;
        const INVISIBLE  = 1 << 6;
        const STRUCK     = 1 << 7;
        /// The line continues on the next row
        const WRAP       = 1 << 8;
        /// First half of a double-width character
        const WIDE       = 1 << 9;
        /// Trailing half of a double-width character, never drawn
        const WDUMMY     = 1 << 10;

        const BOLD_FAINT = Self::BOLD.bits() | Self::FAINT.bits();
    }
}

/// A single cell in the terminal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Codepoint shown in this cell
    pub c: char,
    pub attr: Attr,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    /// Blank cell carrying the colors of `template`
    pub fn blank(template: &Cell) -> Self {
        Self {
            c: ' ',
            attr: Attr::empty(),
            fg: template.fg,
            bg: template.bg,
        }
    }

    /// Create a cell with a character and default attributes
    pub fn with_char(c: char) -> Self {
        Self {
            c,
            ..Self::default()
        }
    }

    /// Rendering attributes match: same attribute bits and colors. The
    /// line-wrap bit does not affect how a cell looks and is ignored.
    pub fn same_style(&self, other: &Cell) -> bool {
        self.attr - Attr::WRAP == other.attr - Attr::WRAP
            && self.fg == other.fg
            && self.bg == other.bg
    }

    pub fn is_wide_dummy(&self) -> bool {
        self.attr.contains(Attr::WDUMMY)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            c: ' ',
            attr: Attr::empty(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_default() {
        let cell = Cell::default();
        assert_eq!(cell.c, ' ');
        assert!(cell.attr.is_empty());
        assert_eq!(cell.fg, Color::Default);
    }

    #[test]
    fn test_same_style_ignores_codepoint() {
        let a = Cell::with_char('a');
        let mut b = Cell::with_char('b');
        assert!(a.same_style(&b));

        b.attr.insert(Attr::WRAP);
        assert!(a.same_style(&b));

        b.attr.insert(Attr::BOLD);
        assert!(!a.same_style(&b));
    }

    #[test]
    fn test_same_style_compares_colors() {
        let a = Cell::with_char('a');
        let mut b = a;
        b.bg = Color::Indexed(4);
        assert!(!a.same_style(&b));
    }

    #[test]
    fn test_blank_keeps_template_colors() {
        let mut template = Cell::with_char('x');
        template.bg = Color::Indexed(2);
        template.attr = Attr::BOLD;
        let blank = Cell::blank(&template);
        assert_eq!(blank.c, ' ');
        assert_eq!(blank.bg, Color::Indexed(2));
        assert!(blank.attr.is_empty());
    }
}
