//! Cell colors as stored in the grid
//!
//! Colors stay symbolic until render time: the front end owns the palette
//! and decides what `Default` means for the foreground and background.

/// Color of a cell's foreground or background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The configured default for the slot it appears in
    #[default]
    Default,
    /// Palette entry (0-255)
    Indexed(u8),
    /// 24-bit true color
    Rgb(u8, u8, u8),
}

impl Color {
    /// Pack a true color into `0x00RRGGBB`
    pub fn rgb_value(r: u8, g: u8, b: u8) -> u32 {
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    /// True for 24-bit colors, which bypass the palette
    pub fn is_truecolor(&self) -> bool {
        matches!(self, Color::Rgb(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_default() {
        assert_eq!(Color::default(), Color::Default);
    }

    #[test]
    fn test_rgb_value_packing() {
        assert_eq!(Color::rgb_value(0x12, 0x34, 0x56), 0x123456);
        assert!(Color::Rgb(1, 2, 3).is_truecolor());
        assert!(!Color::Indexed(3).is_truecolor());
    }
}
