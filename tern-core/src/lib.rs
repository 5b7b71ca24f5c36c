//! Tern Core - the terminal model behind the tern front end
//!
//! This crate owns everything the display side treats as a black box:
//! - A grid of cells (codepoint, attribute bits, colors) per screen buffer
//! - A dirty-row bitmap that the renderer drains every frame
//! - The cursor and the terminal mode flags set by escape sequences
//! - An xterm-compatible escape interpreter driven by `vte`
//!
//! Feeding the same bytes always yields the same grid.

mod cell;
mod color;
mod grid;
mod mode;
mod perform;
mod term;

pub use cell::{Attr, Cell};
pub use color::Color;
pub use grid::Grid;
pub use mode::TermMode;
pub use term::{Cursor, Term};

/// Default word delimiters used for word snapping.
pub const WORD_DELIMITERS: &str = " ";
