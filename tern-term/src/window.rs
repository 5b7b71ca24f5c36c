//! The window: winit for events, softbuffer for pixels
//!
//! [`WinitDisplay`] pumps the winit event loop without blocking and
//! translates its events into [`DisplayEventSink`] calls. [`SurfaceCanvas`]
//! keeps a CPU frame, rasterizes glyphs with fontdue and presents only the
//! damaged rectangles.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::os::fd::{AsFd, BorrowedFd};
use std::rc::Rc;
use std::time::Duration;

use fontdue::Metrics;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, KeyLocation, ModifiersState, NamedKey, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::error::{Error, Result};
use crate::event::{DisplayEventSink, KeyPress};
use crate::event_loop::Display;
use crate::font::LoadedFont;
use crate::input::{Keysym, ModMask};
use crate::mouse::{Axis, Button};
use crate::render::{Canvas, PixelBuffer, TextRun};

/// Open a window with the given inner size and its drawing surface
pub fn open(title: &str, width: u32, height: u32) -> Result<(WinitDisplay, SurfaceCanvas)> {
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)?;
    let window = Rc::new(window);

    let canvas = SurfaceCanvas::new(window.clone(), width, height)?;
    let display = WinitDisplay {
        event_loop,
        window,
        mods: ModMask::empty(),
        pointer: None,
        keys: HashMap::new(),
    };
    Ok((display, canvas))
}

pub struct WinitDisplay {
    event_loop: EventLoop<()>,
    window: Rc<Window>,
    mods: ModMask,
    /// Pointer position inside the window; `None` until the first motion
    /// after it enters
    pointer: Option<(f64, f64)>,
    /// Small ids for physical keys, used to match repeat releases
    keys: HashMap<PhysicalKey, u32>,
}

impl Display for WinitDisplay {
    fn fd(&self) -> BorrowedFd<'_> {
        self.event_loop.as_fd()
    }

    fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn dispatch(&mut self, sink: &mut dyn DisplayEventSink) -> Result<bool> {
        let Self {
            event_loop,
            mods,
            pointer,
            keys,
            ..
        } = self;

        let status = event_loop.pump_events(Some(Duration::ZERO), |event, _| {
            if let Event::WindowEvent { event, .. } = event {
                translate(event, sink, mods, pointer, keys);
            }
        });
        Ok(!matches!(status, PumpStatus::Exit(_)))
    }
}

fn translate(
    event: WindowEvent,
    sink: &mut dyn DisplayEventSink,
    mods: &mut ModMask,
    pointer: &mut Option<(f64, f64)>,
    keys: &mut HashMap<PhysicalKey, u32>,
) {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let next = keys.len() as u32 + 1;
            let key = *keys.entry(event.physical_key).or_insert(next);
            match event.state {
                ElementState::Pressed => {
                    // Repeat is generated locally
                    if event.repeat {
                        return;
                    }
                    let sym = keysym(&event.logical_key, event.location, *mods);
                    let mut press = KeyPress::new(key, sym);
                    if let Some(text) = event.logical_key.to_text() {
                        press = press.with_text(text);
                    }
                    sink.on_key_press(&press);
                }
                ElementState::Released => sink.on_key_release(key),
            }
        }
        WindowEvent::ModifiersChanged(state) => {
            *mods = mod_mask(state.state());
            sink.on_modifiers(*mods);
        }
        // winit reports the entry position with the next motion
        WindowEvent::CursorEntered { .. } | WindowEvent::CursorLeft { .. } => *pointer = None,
        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = (position.x, position.y);
            if pointer.replace((x, y)).is_some() {
                sink.on_pointer_motion(x, y);
            } else {
                sink.on_pointer_enter(x, y);
            }
        }
        WindowEvent::MouseInput { state, button, .. } => {
            sink.on_pointer_button(button_of(button), state == ElementState::Pressed);
        }
        WindowEvent::MouseWheel { delta, .. } => {
            // winit deltas point the way the content moves
            let (x, y) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (x as f64, y as f64),
                MouseScrollDelta::PixelDelta(pos) => (pos.x, pos.y),
            };
            if y != 0.0 {
                sink.on_pointer_axis(Axis::Vertical, -y);
            }
            if x != 0.0 {
                sink.on_pointer_axis(Axis::Horizontal, -x);
            }
        }
        WindowEvent::Focused(true) => sink.on_focus_enter(),
        WindowEvent::Focused(false) => sink.on_focus_leave(),
        WindowEvent::Resized(size) => sink.on_resize(size.width, size.height),
        WindowEvent::Occluded(true) => sink.on_surface_leave(),
        WindowEvent::Occluded(false) => sink.on_surface_enter(),
        WindowEvent::RedrawRequested => sink.on_frame_complete(),
        WindowEvent::CloseRequested => sink.on_close(),
        _ => {}
    }
}

fn mod_mask(state: ModifiersState) -> ModMask {
    let mut mask = ModMask::empty();
    mask.set(ModMask::SHIFT, state.shift_key());
    mask.set(ModMask::CTRL, state.control_key());
    mask.set(ModMask::ALT, state.alt_key());
    mask.set(ModMask::LOGO, state.super_key());
    mask
}

fn button_of(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Middle => Button::Middle,
        MouseButton::Right => Button::Right,
        MouseButton::Back => Button::Other(8),
        MouseButton::Forward => Button::Other(9),
        MouseButton::Other(n) => Button::Other(n),
    }
}

fn keysym(key: &Key, location: KeyLocation, mods: ModMask) -> Keysym {
    if location == KeyLocation::Numpad {
        if let Some(sym) = keypad_sym(key) {
            return sym;
        }
    }
    match key {
        Key::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Keysym::Char(c),
                _ => Keysym::Other,
            }
        }
        Key::Named(named) => named_sym(*named, mods),
        _ => Keysym::Other,
    }
}

fn keypad_sym(key: &Key) -> Option<Keysym> {
    match key {
        Key::Named(NamedKey::Enter) => Some(Keysym::KpEnter),
        Key::Character(s) => match s.as_str() {
            "+" => Some(Keysym::KpAdd),
            "-" => Some(Keysym::KpSubtract),
            "*" => Some(Keysym::KpMultiply),
            "/" => Some(Keysym::KpDivide),
            "." | "," => Some(Keysym::KpDecimal),
            d if d.len() == 1 => d
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .map(|n| Keysym::KpDigit(n as u8)),
            _ => None,
        },
        _ => None,
    }
}

fn named_sym(key: NamedKey, mods: ModMask) -> Keysym {
    match key {
        NamedKey::Backspace => Keysym::BackSpace,
        NamedKey::Tab if mods.contains(ModMask::SHIFT) => Keysym::IsoLeftTab,
        NamedKey::Tab => Keysym::Tab,
        NamedKey::Enter => Keysym::Return,
        NamedKey::Escape => Keysym::Escape,
        NamedKey::Space => Keysym::Char(' '),
        NamedKey::Insert => Keysym::Insert,
        NamedKey::Delete => Keysym::Delete,
        NamedKey::Home => Keysym::Home,
        NamedKey::End => Keysym::End,
        NamedKey::PageUp => Keysym::PageUp,
        NamedKey::PageDown => Keysym::PageDown,
        NamedKey::ArrowUp => Keysym::Up,
        NamedKey::ArrowDown => Keysym::Down,
        NamedKey::ArrowLeft => Keysym::Left,
        NamedKey::ArrowRight => Keysym::Right,
        NamedKey::NumLock => Keysym::NumLock,
        NamedKey::F1 => Keysym::F(1),
        NamedKey::F2 => Keysym::F(2),
        NamedKey::F3 => Keysym::F(3),
        NamedKey::F4 => Keysym::F(4),
        NamedKey::F5 => Keysym::F(5),
        NamedKey::F6 => Keysym::F(6),
        NamedKey::F7 => Keysym::F(7),
        NamedKey::F8 => Keysym::F(8),
        NamedKey::F9 => Keysym::F(9),
        NamedKey::F10 => Keysym::F(10),
        NamedKey::F11 => Keysym::F(11),
        NamedKey::F12 => Keysym::F(12),
        _ => Keysym::Other,
    }
}

type GlyphKey = ((usize, u32, u32), char);

/// The window surface as a drawing target
pub struct SurfaceCanvas {
    window: Rc<Window>,
    _context: softbuffer::Context<Rc<Window>>,
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    frame: PixelBuffer,
    damage: Vec<softbuffer::Rect>,
    glyphs: HashMap<GlyphKey, (Metrics, Vec<u8>)>,
}

impl SurfaceCanvas {
    fn new(window: Rc<Window>, width: u32, height: u32) -> Result<Self> {
        let context = softbuffer::Context::new(window.clone())?;
        let surface = softbuffer::Surface::new(&context, window.clone())?;
        Ok(Self {
            window,
            _context: context,
            surface,
            frame: PixelBuffer::new(width, height),
            damage: Vec::new(),
            glyphs: HashMap::new(),
        })
    }

    /// Clip to the frame; None when nothing is left
    fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> Option<softbuffer::Rect> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.frame.width() as i32);
        let y1 = y.saturating_add(h).min(self.frame.height() as i32);
        Some(softbuffer::Rect {
            x: x0 as u32,
            y: y0 as u32,
            width: NonZeroU32::new(x1.checked_sub(x0).filter(|&n| n > 0)? as u32)?,
            height: NonZeroU32::new(y1.checked_sub(y0).filter(|&n| n > 0)? as u32)?,
        })
    }
}

impl Canvas<LoadedFont> for SurfaceCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.frame.resize(width, height);
        self.damage.clear();
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.frame.fill_rect(x, y, w, h, color);
    }

    fn draw_text(&mut self, font: &LoadedFont, run: &TextRun<'_>, color: u32) {
        let id = font.cache_key();
        for (c, x) in run.positions() {
            if c == ' ' {
                continue;
            }
            let (metrics, coverage) = self
                .glyphs
                .entry((id, c))
                .or_insert_with(|| font.rasterize(c));
            if metrics.width == 0 || metrics.height == 0 {
                continue;
            }
            let top = run.baseline - (metrics.height as i32 + metrics.ymin);
            self.frame.blend(
                x + metrics.xmin,
                top,
                metrics.width,
                metrics.height,
                coverage,
                color,
            );
        }
    }

    fn damage(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if let Some(rect) = self.clip(x, y, w, h) {
            self.damage.push(rect);
        }
    }

    fn commit(&mut self) -> Result<()> {
        let (Some(width), Some(height)) = (
            NonZeroU32::new(self.frame.width()),
            NonZeroU32::new(self.frame.height()),
        ) else {
            self.damage.clear();
            return Ok(());
        };

        self.surface.resize(width, height)?;
        let mut buffer = self.surface.buffer_mut()?;
        if buffer.len() != self.frame.pixels().len() {
            return Err(Error::Surface(format!(
                "buffer holds {} pixels, frame has {}",
                buffer.len(),
                self.frame.pixels().len()
            )));
        }
        buffer.copy_from_slice(self.frame.pixels());

        self.window.pre_present_notify();
        if self.damage.is_empty() {
            buffer.present()?;
        } else {
            buffer.present_with_damage(&self.damage)?;
        }
        self.damage.clear();

        // The next RedrawRequested tells the pacer this frame is done
        self.window.request_redraw();
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_mask_from_winit() {
        let state = ModifiersState::SHIFT | ModifiersState::CONTROL;
        assert_eq!(mod_mask(state), ModMask::SHIFT | ModMask::CTRL);
        assert_eq!(mod_mask(ModifiersState::empty()), ModMask::empty());
    }

    #[test]
    fn test_keysym_translation() {
        let standard = KeyLocation::Standard;
        assert_eq!(
            keysym(&Key::Character("a".into()), standard, ModMask::empty()),
            Keysym::Char('a')
        );
        assert_eq!(
            keysym(&Key::Named(NamedKey::Tab), standard, ModMask::SHIFT),
            Keysym::IsoLeftTab
        );
        assert_eq!(
            keysym(&Key::Named(NamedKey::F5), standard, ModMask::empty()),
            Keysym::F(5)
        );
    }

    #[test]
    fn test_keypad_keys() {
        let pad = KeyLocation::Numpad;
        assert_eq!(
            keysym(&Key::Character("7".into()), pad, ModMask::empty()),
            Keysym::KpDigit(7)
        );
        assert_eq!(
            keysym(&Key::Named(NamedKey::Enter), pad, ModMask::empty()),
            Keysym::KpEnter
        );
        assert_eq!(
            keysym(&Key::Character("+".into()), pad, ModMask::empty()),
            Keysym::KpAdd
        );
    }

    /// Keeps the pointer calls, ignores everything else
    #[derive(Default)]
    struct PointerLog(Vec<(&'static str, f64, f64)>);

    impl DisplayEventSink for PointerLog {
        fn on_key_press(&mut self, _key: &KeyPress) {}
        fn on_key_release(&mut self, _key: u32) {}
        fn on_modifiers(&mut self, _mods: ModMask) {}
        fn on_pointer_enter(&mut self, x: f64, y: f64) {
            self.0.push(("enter", x, y));
        }
        fn on_pointer_motion(&mut self, x: f64, y: f64) {
            self.0.push(("motion", x, y));
        }
        fn on_pointer_button(&mut self, _button: Button, _pressed: bool) {}
        fn on_pointer_axis(&mut self, _axis: Axis, _value: f64) {}
        fn on_focus_enter(&mut self) {}
        fn on_focus_leave(&mut self) {}
        fn on_resize(&mut self, _width: u32, _height: u32) {}
        fn on_surface_enter(&mut self) {}
        fn on_surface_leave(&mut self) {}
        fn on_frame_complete(&mut self) {}
        fn on_clipboard_offer(&mut self, _kind: crate::clipboard::ClipboardKind, _text: &str) {}
        fn on_selection_lost(&mut self, _kind: crate::clipboard::ClipboardKind) {}
        fn on_close(&mut self) {}
    }

    #[test]
    fn test_pointer_enter_waits_for_position() {
        // SAFETY: only compared for equality by winit, never dereferenced
        let device_id = unsafe { winit::event::DeviceId::dummy() };
        let moved = |x, y| WindowEvent::CursorMoved {
            device_id,
            position: winit::dpi::PhysicalPosition::new(x, y),
        };
        let mut sink = PointerLog::default();
        let mut mods = ModMask::empty();
        let mut pointer = None;
        let mut keys = HashMap::new();
        let mut feed = |event, sink: &mut PointerLog| {
            translate(event, sink, &mut mods, &mut pointer, &mut keys)
        };

        feed(moved(10.0, 20.0), &mut sink);
        feed(moved(11.0, 20.0), &mut sink);
        feed(WindowEvent::CursorLeft { device_id }, &mut sink);
        // Nothing stale is replayed on the way back in
        feed(WindowEvent::CursorEntered { device_id }, &mut sink);
        feed(moved(50.0, 5.0), &mut sink);

        assert_eq!(
            sink.0,
            vec![
                ("enter", 10.0, 20.0),
                ("motion", 11.0, 20.0),
                ("enter", 50.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_extra_buttons() {
        assert_eq!(button_of(MouseButton::Back), Button::Other(8));
        assert_eq!(button_of(MouseButton::Other(12)), Button::Other(12));
    }
}
