//! Per-codepoint fallback fonts
//!
//! A fixed ring of recent fallback lookups. When full, a new entry replaces
//! the oldest one regardless of how often that one was used. Failed lookups
//! are stored too, so a codepoint no font has is only searched for once.

use std::rc::Rc;

use super::{Face, FontStyle};

pub const FALLBACK_CAPACITY: usize = 16;

#[derive(Debug)]
struct Entry<F> {
    /// `None` records that no font had the codepoint
    font: Option<Rc<F>>,
    style: FontStyle,
    codepoint: char,
}

#[derive(Debug)]
pub struct FallbackCache<F> {
    entries: Vec<Entry<F>>,
    /// Slot the next insertion goes to
    next: usize,
    capacity: usize,
}

impl<F: Face> FallbackCache<F> {
    pub fn new() -> Self {
        Self::with_capacity(FALLBACK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            next: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached answer for `(style, c)`: `Some(Some(font))` for a usable
    /// font, `Some(None)` for a remembered failure, `None` on a miss.
    ///
    /// An entry answers when its style matches and either its font has the
    /// glyph or it was stored for this very codepoint.
    pub fn find(&self, style: FontStyle, c: char) -> Option<Option<Rc<F>>> {
        self.entries
            .iter()
            .find(|e| {
                e.style == style
                    && (e.codepoint == c || e.font.as_ref().is_some_and(|f| f.has_glyph(c)))
            })
            .map(|e| e.font.clone())
    }

    pub fn insert(&mut self, style: FontStyle, c: char, font: Option<Rc<F>>) {
        let entry = Entry {
            font,
            style,
            codepoint: c,
        };
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.next] = entry;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// Cached lookup, running `query` and remembering its answer on a miss
    pub fn resolve(
        &mut self,
        style: FontStyle,
        c: char,
        query: impl FnOnce() -> Option<Rc<F>>,
    ) -> Option<Rc<F>> {
        if let Some(hit) = self.find(style, c) {
            return hit;
        }
        let font = query();
        if font.is_none() {
            log::debug!("No font has U+{:04X}", c as u32);
        }
        self.insert(style, c, font.clone());
        font
    }

    /// Forget everything (fonts were reloaded at another size)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next = 0;
    }
}

impl<F: Face> Default for FallbackCache<F> {
    fn default() -> Self {
        Self::new()
    }
}
