//! System fonts: discovery with fontdb, rasterization with fontdue

use std::collections::HashMap;
use std::rc::Rc;

use fontdb::{Database, Family, Query, Style, Weight, ID};
use fontdue::{Font, FontSettings, Metrics};

use super::{Face, FaceMetrics, FontProvider, FontSet, FontStyle};
use crate::error::{Error, Result};

/// Families searched for missing glyphs after the configured ones.
/// Monochrome symbol fonts come before emoji.
const FALLBACK_FAMILIES: &[&str] = &[
    "Symbols Nerd Font",
    "DejaVu Sans Mono",
    "Noto Sans Mono",
    "Noto Sans CJK JP",
    "Noto Sans CJK SC",
    "Noto Sans CJK KR",
    "Noto Sans Symbols",
    "Noto Sans Symbols 2",
    "DejaVu Sans",
    "Symbola",
    "Noto Color Emoji",
    "Liberation Sans",
];

/// A face loaded at one pixel size
pub struct LoadedFont {
    font: Font,
    /// Face index within a font collection
    index: u32,
    px: f32,
    metrics: FaceMetrics,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("name", &self.font.name())
            .field("px", &self.px)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl LoadedFont {
    fn from_bytes(data: &[u8], index: u32, px: f32) -> std::result::Result<Self, String> {
        let settings = FontSettings {
            collection_index: index,
            scale: px,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings).map_err(str::to_string)?;

        let (ascent, descent) = match font.horizontal_line_metrics(px) {
            Some(lm) => (lm.ascent.ceil() as i32, (-lm.descent).ceil() as i32),
            None => (px.ceil() as i32, 0),
        };
        let width = font.metrics('M', px).advance_width.ceil().max(1.0) as i32;
        let metrics = FaceMetrics {
            ascent,
            descent,
            width,
            height: ascent + descent,
            bad_slant: false,
            bad_weight: false,
        };
        Ok(Self {
            font,
            index,
            px,
            metrics,
        })
    }

    pub fn px(&self) -> f32 {
        self.px
    }

    /// Identifies this face and size in glyph caches
    pub fn cache_key(&self) -> (usize, u32, u32) {
        (self.font.file_hash(), self.index, self.px.to_bits())
    }

    /// Coverage bitmap of one glyph at this face's size
    pub fn rasterize(&self, c: char) -> (Metrics, Vec<u8>) {
        self.font.rasterize(c, self.px)
    }
}

impl Face for LoadedFont {
    fn has_glyph(&self, c: char) -> bool {
        self.font.lookup_glyph_index(c) != 0
    }

    fn metrics(&self) -> &FaceMetrics {
        &self.metrics
    }
}

fn family(name: &str) -> Family<'_> {
    match name {
        "monospace" => Family::Monospace,
        "serif" => Family::Serif,
        "sans-serif" | "sans" => Family::SansSerif,
        other => Family::Name(other),
    }
}

fn query_for(style: FontStyle) -> (Weight, Style) {
    let weight = if style.is_bold() {
        Weight::BOLD
    } else {
        Weight::NORMAL
    };
    let slant = if style.is_italic() {
        Style::Italic
    } else {
        Style::Normal
    };
    (weight, slant)
}

/// Fonts installed on the system, found through fontconfig-style queries
pub struct SystemFonts {
    db: Database,
    family: String,
    fallback_families: Vec<String>,
    default_size: f32,
    /// Fallback candidates already loaded, by family, style and size
    candidates: HashMap<(String, FontStyle, u32), Option<Rc<LoadedFont>>>,
}

impl SystemFonts {
    pub fn new(family: &str, fallback_families: &[String], default_size: f32) -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        log::info!("Loaded {} system fonts", db.len());

        Self {
            db,
            family: family.to_string(),
            fallback_families: fallback_families.to_vec(),
            default_size,
            candidates: HashMap::new(),
        }
    }

    fn query(&self, name: &str, style: FontStyle) -> Option<ID> {
        let (weight, slant) = query_for(style);
        let families = [family(name)];
        self.db.query(&Query {
            families: &families,
            weight,
            style: slant,
            ..Query::default()
        })
    }

    fn load_id(&self, id: ID, style: FontStyle, px: f32) -> std::result::Result<LoadedFont, String> {
        let mut font = self
            .db
            .with_face_data(id, |data, index| LoadedFont::from_bytes(data, index, px))
            .ok_or_else(|| "font data unavailable".to_string())??;

        if let Some(info) = self.db.face(id) {
            font.metrics.bad_slant = style.is_italic() && info.style == Style::Normal;
            font.metrics.bad_weight = style.is_bold() && info.weight.0 < Weight::SEMIBOLD.0;
        }
        Ok(font)
    }

    fn load_style(&self, style: FontStyle, px: f32) -> Result<Rc<LoadedFont>> {
        let id = self
            .query(&self.family, style)
            .or_else(|| {
                log::warn!("Font '{}' not found, using monospace", self.family);
                self.query("monospace", style)
            })
            .ok_or_else(|| Error::Font {
                family: self.family.clone(),
                reason: "no matching font installed".to_string(),
            })?;
        let font = self.load_id(id, style, px).map_err(|reason| Error::Font {
            family: self.family.clone(),
            reason,
        })?;
        log::debug!("Loaded {:?} face {:?}", style, font);
        Ok(Rc::new(font))
    }

    fn candidate(&mut self, name: &str, style: FontStyle, px: f32) -> Option<Rc<LoadedFont>> {
        let key = (name.to_string(), style, px.to_bits());
        if let Some(cached) = self.candidates.get(&key) {
            return cached.clone();
        }
        let loaded = self
            .query(name, style)
            .and_then(|id| match self.load_id(id, style, px) {
                Ok(font) => Some(Rc::new(font)),
                Err(e) => {
                    log::debug!("Fallback font '{}' failed to load: {}", name, e);
                    None
                }
            });
        self.candidates.insert(key, loaded.clone());
        loaded
    }
}

impl FontProvider<LoadedFont> for SystemFonts {
    fn load(&mut self, size: f32) -> Result<FontSet<LoadedFont>> {
        self.candidates.clear();
        Ok(FontSet {
            regular: self.load_style(FontStyle::Regular, size)?,
            bold: self.load_style(FontStyle::Bold, size)?,
            italic: self.load_style(FontStyle::Italic, size)?,
            bold_italic: self.load_style(FontStyle::BoldItalic, size)?,
            size,
        })
    }

    fn default_size(&self) -> f32 {
        self.default_size
    }

    fn fallback(&mut self, style: FontStyle, c: char, size: f32) -> Option<Rc<LoadedFont>> {
        let names: Vec<String> = self
            .fallback_families
            .iter()
            .cloned()
            .chain(FALLBACK_FAMILIES.iter().map(|s| s.to_string()))
            .collect();
        for name in names {
            if let Some(font) = self.candidate(&name, style, size) {
                if font.has_glyph(c) {
                    log::debug!("U+{:04X} found in '{}'", c as u32, name);
                    return Some(font);
                }
            }
        }
        None
    }
}
