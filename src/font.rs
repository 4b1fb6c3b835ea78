//! Utilities to rasterize the caption text to images

use std::path::Path;

use crate::errors::{ConveyorError, ConveyorResult};
use font_kit::canvas::{Canvas, Format, RasterizationOptions};
use font_kit::family_name::FamilyName;
use font_kit::font::Font;
use font_kit::hinting::HintingOptions;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;

use image::{Rgb, RgbImage};
use pathfinder_geometry::transform2d::Transform2F;
use pathfinder_geometry::vector::{Vector2F, Vector2I};

/// A font renderer to rasterize text to images
#[derive(Debug)]
pub struct FontRenderer {
    font: Font,
}

impl FontRenderer {
    /// Create a new font renderer, selecting the system's sans-serif font.
    pub fn new() -> ConveyorResult<Self> {
        let font = SystemSource::new()
            .select_best_match(&[FamilyName::SansSerif], &Properties::new())
            .map_err(|e| ConveyorError::FontError(format!("{:?}", e)))?
            .load()
            .map_err(|e| ConveyorError::FontError(format!("{:?}", e)))?;
        info!("Font: {} ({})", font.full_name(), font.family_name());
        Ok(Self { font })
    }

    /// Create a new font renderer from a font file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConveyorResult<Self> {
        let font = Font::from_path(path.as_ref(), 0).map_err(|e| {
            ConveyorError::FontError(format!("{}: {:?}", path.as_ref().display(), e))
        })?;
        Ok(Self { font })
    }

    /// Render white text on a black box, `size` pixels high plus padding.
    ///
    /// The box is as wide as the text, but never wider than `max_width`;
    /// glyphs that do not fit are dropped.
    pub fn render(&self, text: &str, size: f32, max_width: u32) -> ConveyorResult<RgbImage> {
        let hinting = HintingOptions::None;
        let rasterization = RasterizationOptions::GrayscaleAa;
        let metrics = self.font.metrics();
        let scale = size / metrics.units_per_em as f32;
        let padding = (size / 4.).ceil();
        let baseline = padding + metrics.ascent * scale;

        let mut glyphs = Vec::new();
        let mut pen_x = padding;
        for c in text.chars() {
            if let Some(glyph_id) = self.font.glyph_for_char(c) {
                let advance = self
                    .font
                    .advance(glyph_id)
                    .map_err(|e| ConveyorError::FontError(format!("{:?}", e)))?
                    .x()
                    * scale;
                if pen_x + advance + padding > max_width as f32 {
                    break;
                }
                glyphs.push((glyph_id, pen_x));
                pen_x += advance;
            }
        }

        let width = ((pen_x + padding).ceil() as u32).clamp(1, max_width.max(1));
        let height = (size * 1.5).ceil() as u32;
        let mut canvas = Canvas::new(Vector2I::new(width as _, height as _), Format::A8);
        for (glyph_id, x) in glyphs {
            self.font
                .rasterize_glyph(
                    &mut canvas,
                    glyph_id,
                    size,
                    Transform2F::from_translation(Vector2F::new(x, baseline)),
                    hinting,
                    rasterization,
                )
                .map_err(|e| ConveyorError::FontError(format!("{:?}", e)))?;
        }

        Ok(RgbImage::from_fn(width, height, |x, y| {
            let coverage = canvas.pixels[y as usize * canvas.stride + x as usize];
            Rgb([coverage, coverage, coverage])
        }))
    }
}
