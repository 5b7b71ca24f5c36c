//! Tern - the display side of a small xterm-compatible terminal
//!
//! The terminal model lives in `tern-core` and the child process in
//! `tern-pty`. This crate does everything between them and the screen:
//! - `app`: the state machine that reacts to display events and child output
//! - `input`, `bindings`, `mouse`: key encoding, shortcuts and mouse reports
//! - `selection`, `clipboard`: text selection and the primary/clipboard buffers
//! - `render`, `font`, `damage`: the software renderer and its fonts
//! - `timers`, `pacer`: blinking, key repeat and frame pacing
//! - `event_loop`, `window`: the poll loop and the winit/softbuffer window

pub mod app;
pub mod bindings;
pub mod clipboard;
pub mod config;
pub mod damage;
pub mod error;
pub mod event;
pub mod event_loop;
pub mod font;
pub mod input;
pub mod model;
pub mod mouse;
pub mod pacer;
pub mod render;
pub mod selection;
pub mod timers;
pub mod window;

pub use app::{App, Tty, WinMode};
pub use error::{Error, Result};
pub use event::{DisplayEventSink, KeyPress};
pub use model::TermModel;
