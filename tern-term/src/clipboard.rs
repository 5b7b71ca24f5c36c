//! Clipboard access and selection ownership
//!
//! A finished selection is offered as the primary selection; the copy
//! shortcut also places it on the clipboard. While we own a buffer, pastes
//! from it use the local copy.

use std::collections::HashMap;

use arboard::Clipboard;
#[cfg(all(unix, not(target_os = "macos")))]
use arboard::{GetExtLinux, LinuxClipboardKind, SetExtLinux};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardKind {
    Clipboard,
    /// The X11/Wayland primary selection
    Primary,
}

pub trait ClipboardProvider {
    /// Offer text; false if the system refused it
    fn set_text(&mut self, kind: ClipboardKind, text: &str) -> bool;

    fn get_text(&mut self, kind: ClipboardKind) -> Option<String>;
}

/// The system clipboard through `arboard`
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                log::warn!("Clipboard not available: {}", e);
                None
            }
        };
        Self { inner }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, kind: ClipboardKind, text: &str) -> bool {
        let Some(clipboard) = &mut self.inner else {
            return false;
        };
        let result = match kind {
            ClipboardKind::Clipboard => clipboard.set_text(text),
            #[cfg(all(unix, not(target_os = "macos")))]
            ClipboardKind::Primary => clipboard
                .set()
                .clipboard(LinuxClipboardKind::Primary)
                .text(text),
            #[cfg(not(all(unix, not(target_os = "macos"))))]
            ClipboardKind::Primary => return false,
        };
        match result {
            Ok(()) => {
                log::debug!("Offered {} bytes as {:?}", text.len(), kind);
                true
            }
            Err(e) => {
                log::warn!("Failed to set {:?}: {}", kind, e);
                false
            }
        }
    }

    fn get_text(&mut self, kind: ClipboardKind) -> Option<String> {
        let clipboard = self.inner.as_mut()?;
        let result = match kind {
            ClipboardKind::Clipboard => clipboard.get_text(),
            #[cfg(all(unix, not(target_os = "macos")))]
            ClipboardKind::Primary => clipboard
                .get()
                .clipboard(LinuxClipboardKind::Primary)
                .text(),
            #[cfg(not(all(unix, not(target_os = "macos"))))]
            ClipboardKind::Primary => return None,
        };
        result
            .map_err(|e| log::debug!("Nothing to paste from {:?}: {}", kind, e))
            .ok()
    }
}

/// A process-local clipboard, for when no display clipboard exists
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    buffers: HashMap<ClipboardKind, String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn set_text(&mut self, kind: ClipboardKind, text: &str) -> bool {
        self.buffers.insert(kind, text.to_string());
        true
    }

    fn get_text(&mut self, kind: ClipboardKind) -> Option<String> {
        self.buffers.get(&kind).cloned()
    }
}

/// Text we currently offer, per buffer
#[derive(Debug, Default, Clone)]
pub struct Ownership {
    owned: HashMap<ClipboardKind, String>,
}

impl Ownership {
    pub fn own(&mut self, kind: ClipboardKind, text: String) {
        self.owned.insert(kind, text);
    }

    pub fn owned(&self, kind: ClipboardKind) -> Option<&str> {
        self.owned.get(&kind).map(String::as_str)
    }

    /// Another client took the buffer; true if we held it
    pub fn release(&mut self, kind: ClipboardKind) -> bool {
        self.owned.remove(&kind).is_some()
    }
}
