//! Events from the window system
//!
//! The windowing adapter translates whatever its toolkit delivers into
//! calls on a [`DisplayEventSink`]. The application implements the sink;
//! tests drive it directly.

use std::time::Duration;

use crate::clipboard::ClipboardKind;
use crate::input::{Keysym, ModMask};
use crate::mouse::{Axis, Button};

/// A key going down
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    /// Physical key code; the release of this code stops auto-repeat
    pub key: u32,
    pub sym: Keysym,
    /// Text the keyboard layout produced, before modifiers are applied
    pub text: Option<String>,
}

impl KeyPress {
    pub fn new(key: u32, sym: Keysym) -> Self {
        Self {
            key,
            sym,
            text: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

pub trait DisplayEventSink {
    fn on_key_press(&mut self, key: &KeyPress);
    fn on_key_release(&mut self, key: u32);
    /// Modifier state after any change
    fn on_modifiers(&mut self, mods: ModMask);
    /// Repeat timing announced by the display server
    fn on_repeat_info(&mut self, _delay: Duration, _interval: Duration) {}

    /// Pointer coordinates are window pixels
    fn on_pointer_enter(&mut self, x: f64, y: f64);
    fn on_pointer_motion(&mut self, x: f64, y: f64);
    fn on_pointer_button(&mut self, button: Button, pressed: bool);
    /// Positive values scroll down or right
    fn on_pointer_axis(&mut self, axis: Axis, value: f64);

    fn on_focus_enter(&mut self);
    fn on_focus_leave(&mut self);

    fn on_resize(&mut self, width: u32, height: u32);
    /// The surface became visible on an output
    fn on_surface_enter(&mut self);
    fn on_surface_leave(&mut self);
    /// The compositor finished with the last frame
    fn on_frame_complete(&mut self);

    /// Text to paste arrived
    fn on_clipboard_offer(&mut self, kind: ClipboardKind, text: &str);
    /// Another client took over a buffer we offered
    fn on_selection_lost(&mut self, kind: ClipboardKind);

    fn on_close(&mut self);
}
