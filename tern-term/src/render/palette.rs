//! The 256-color palette plus the default and cursor slots

use tern_core::{Cell, Color};

pub const DEFAULT_FG: usize = 256;
pub const DEFAULT_BG: usize = 257;
pub const CURSOR: usize = 258;
pub const REVERSE_CURSOR: usize = 259;
const SLOTS: usize = 260;

/// A color as the renderer refers to it before resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRef {
    /// Palette slot, including the default and cursor slots
    Slot(usize),
    /// 24-bit color, 0xRRGGBB
    Rgb(u32),
}

impl ColorRef {
    pub fn foreground(color: Color) -> Self {
        match color {
            Color::Default => ColorRef::Slot(DEFAULT_FG),
            Color::Indexed(i) => ColorRef::Slot(i as usize),
            Color::Rgb(r, g, b) => ColorRef::Rgb(Color::rgb_value(r, g, b)),
        }
    }

    pub fn background(color: Color) -> Self {
        match color {
            Color::Default => ColorRef::Slot(DEFAULT_BG),
            Color::Indexed(i) => ColorRef::Slot(i as usize),
            Color::Rgb(r, g, b) => ColorRef::Rgb(Color::rgb_value(r, g, b)),
        }
    }

    pub fn of_cell(cell: &Cell) -> (Self, Self) {
        (Self::foreground(cell.fg), Self::background(cell.bg))
    }
}

/// Channel level of a 6x6x6 cube coordinate
pub fn cube_level(x: u8) -> u8 {
    if x == 0 {
        0
    } else {
        0x37 + 0x28 * x
    }
}

#[derive(Debug, Clone)]
pub struct Palette {
    colors: [u32; SLOTS],
}

impl Palette {
    /// Build from the 16 base colors and the four extra slots (0xRRGGBB)
    pub fn new(base: &[u32; 16], fg: u32, bg: u32, cursor: u32, reverse_cursor: u32) -> Self {
        let mut colors = [0u32; SLOTS];
        colors[..16].copy_from_slice(base);

        for i in 0..216usize {
            let r = cube_level((i / 36 % 6) as u8) as u32;
            let g = cube_level((i / 6 % 6) as u8) as u32;
            let b = cube_level((i % 6) as u8) as u32;
            colors[16 + i] = (r << 16) | (g << 8) | b;
        }
        for i in 232..256usize {
            let level = (0x08 + 0x0a * (i - 232)) as u32;
            colors[i] = (level << 16) | (level << 8) | level;
        }

        colors[DEFAULT_FG] = fg;
        colors[DEFAULT_BG] = bg;
        colors[CURSOR] = cursor;
        colors[REVERSE_CURSOR] = reverse_cursor;
        Self { colors }
    }

    pub fn get(&self, slot: usize) -> u32 {
        self.colors.get(slot).copied().unwrap_or(self.colors[DEFAULT_FG])
    }

    pub fn resolve(&self, color: ColorRef) -> u32 {
        match color {
            ColorRef::Slot(slot) => self.get(slot),
            ColorRef::Rgb(rgb) => rgb,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&DEFAULT_BASE, 0xe5e5e5, 0x000000, 0xcccccc, 0x555555)
    }
}

/// xterm's default 16 colors
pub const DEFAULT_BASE: [u32; 16] = [
    0x000000, 0xcd0000, 0x00cd00, 0xcdcd00, 0x0000ee, 0xcd00cd, 0x00cdcd, 0xe5e5e5, 0x7f7f7f,
    0xff0000, 0x00ff00, 0xffff00, 0x5c5cff, 0xff00ff, 0x00ffff, 0xffffff,
];
