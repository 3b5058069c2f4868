//! Glyph rasterization for the control panel's time readout. The font is
//! loaded from a user-supplied path at startup (this repository ships no
//! font binaries); the panel simply omits text when no font is configured.

use std::collections::HashMap;
use std::path::Path;

use fontdue::{Font, FontSettings, Metrics};

use crate::SceneError;

/// Characters the panel can ever render; metrics are sampled over this set
/// so the monospace-style cell covers every glyph.
const SAMPLE_CHARS: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', '?'];

#[derive(Clone)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub xmin: i32,
    pub ymin: i32,
    pub alpha: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct GlyphLayout {
    pub line_height: u32,
    pub cell_advance: u32,
    pub ascent: i32,
    pub left_bearing: i32,
}

pub struct PanelFont {
    font: Font,
    size_px: f32,
    layout: GlyphLayout,
    cache: HashMap<char, GlyphBitmap>,
}

impl PanelFont {
    pub fn load(path: &Path, size_px: f32) -> Result<Self, SceneError> {
        let data = std::fs::read(path).map_err(|source| SceneError::FontRead {
            path: path.display().to_string(),
            source,
        })?;
        let font =
            Font::from_bytes(data, FontSettings::default()).map_err(|reason| {
                SceneError::FontParse {
                    path: path.display().to_string(),
                    reason,
                }
            })?;
        let layout = GlyphLayout::from_font(&font, size_px);
        Ok(Self {
            font,
            size_px,
            layout,
            cache: HashMap::new(),
        })
    }

    pub fn layout(&self) -> GlyphLayout {
        self.layout
    }

    pub fn glyph(&mut self, ch: char) -> GlyphBitmap {
        if let Some(glyph) = self.cache.get(&ch) {
            return glyph.clone();
        }
        let glyph_index = self.font.lookup_glyph_index(ch);
        let lookup = if glyph_index == 0 && ch != '?' {
            self.font.lookup_glyph_index('?')
        } else {
            glyph_index
        };
        let (metrics, bitmap) = self.font.rasterize_indexed(lookup, self.size_px);
        let glyph = GlyphBitmap {
            width: metrics.width as u32,
            height: metrics.height as u32,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            alpha: bitmap,
        };
        self.cache.insert(ch, glyph.clone());
        glyph
    }
}

impl GlyphLayout {
    fn from_font(font: &Font, size: f32) -> Self {
        let mut min_xmin = 0;
        let mut max_xmax = 0;
        let mut min_ymin = 0;
        let mut max_ymax = 0;
        let mut max_advance = 0.0f32;
        let mut initialized = false;

        for &ch in SAMPLE_CHARS {
            let glyph_index = font.lookup_glyph_index(ch);
            let metrics: Metrics = font.metrics_indexed(glyph_index, size);
            max_advance = max_advance.max(metrics.advance_width);

            if metrics.width == 0 && metrics.height == 0 {
                continue;
            }

            let xmax = metrics.xmin + metrics.width as i32;
            let ymax = metrics.ymin + metrics.height as i32;
            if !initialized {
                min_xmin = metrics.xmin;
                max_xmax = xmax;
                min_ymin = metrics.ymin;
                max_ymax = ymax;
                initialized = true;
            } else {
                min_xmin = min_xmin.min(metrics.xmin);
                max_xmax = max_xmax.max(xmax);
                min_ymin = min_ymin.min(metrics.ymin);
                max_ymax = max_ymax.max(ymax);
            }
        }

        if !initialized {
            return Self {
                line_height: 1,
                cell_advance: 1,
                ascent: 0,
                left_bearing: 0,
            };
        }

        let left_bearing = -min_xmin;
        let descent = -min_ymin;
        let ascent = max_ymax;
        let cell_width = (left_bearing + max_xmax).max(1) as u32;
        let advance = max_advance.max(cell_width as f32).ceil() as u32;

        Self {
            line_height: (ascent + descent).max(1) as u32,
            cell_advance: advance.max(1),
            ascent,
            left_bearing,
        }
    }
}
