//! Glyph-advance text measurement backed by the system font database.
//!
//! Faces are resolved once per (family, weight) and reduced to an advance
//! table, so measuring never holds on to the raw font bytes.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of a single line of text in CSS pixels, or `None` when no usable
/// face is installed for `font_family`.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str, bold: bool) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family, bold)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    bold: bool,
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<FaceKey, Option<FaceAdvances>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str, bold: bool) -> Option<f32> {
        let key = FaceKey {
            family: normalize_family_key(font_family),
            bold,
        };
        if !self.cache.contains_key(&key) {
            let face = self.load_face(font_family, bold);
            self.cache.insert(key.clone(), face);
        }
        let face = self.cache.get(&key)?.as_ref()?;
        Some(face.measure_width(&text.replace('\t', "    "), font_size))
    }

    fn load_face(&mut self, font_family: &str, bold: bool) -> Option<FaceAdvances> {
        let names = family_names(font_family);
        let mut families: Vec<Family<'_>> = Vec::with_capacity(names.len());
        for name in &names {
            families.push(match name.as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                other => Family::Name(other),
            });
        }
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| {
                Face::parse(data, index).ok().map(|face| FaceAdvances::from_face(&face))
            })
            .flatten()
    }
}

/// Horizontal advances pulled out of a parsed face.
struct FaceAdvances {
    units_per_em: u16,
    ascii: [u16; 128],
    other: HashMap<char, Option<u16>>,
}

impl FaceAdvances {
    fn from_face(face: &Face<'_>) -> Self {
        let mut ascii = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        // Common non-ASCII symbols that show up in automaton labels.
        let mut other = HashMap::new();
        for ch in ['ε', 'λ', '…', '·', '→', 'δ', 'Σ'] {
            let advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph));
            other.insert(ch, advance);
        }
        Self {
            units_per_em: face.units_per_em().max(1),
            ascii,
            other,
        }
    }

    fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if ch.is_ascii() {
                Some(self.ascii[ch as usize]).filter(|advance| *advance > 0)
            } else {
                self.other.get(&ch).copied().flatten()
            };
            width += match advance {
                Some(advance) => advance as f32 * scale,
                None => fallback,
            };
        }
        width.max(0.0)
    }
}

fn family_names(font_family: &str) -> Vec<String> {
    font_family
        .split(',')
        .map(|part| part.trim().trim_matches('"').trim_matches('\''))
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_ascii_lowercase();
            match lower.as_str() {
                "serif" | "sans-serif" | "monospace" | "cursive" | "fantasy" | "system-ui"
                | "-apple-system" | "ui-sans-serif" | "ui-monospace" => lower,
                _ => part.to_string(),
            }
        })
        .collect()
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(measure_text_width("", 11.0, "sans-serif", false), Some(0.0));
        assert_eq!(measure_text_width("abc", 0.0, "sans-serif", false), Some(0.0));
    }

    #[test]
    fn family_names_keep_generic_tokens_lowercase() {
        assert_eq!(
            family_names("Inter, \"Segoe UI\", System-UI, sans-serif"),
            vec!["Inter", "Segoe UI", "system-ui", "sans-serif"]
        );
        assert!(family_names(" , ").is_empty());
    }
}
