use crate::config::FontSpec;
use crate::error::{SheetError, SheetResult};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::{DynamicImage, GenericImage, GenericImageView, Rgba};
use log::debug;
use std::fs;
use std::path::Path;

/// 未指定字型檔時使用的內建字型（DejaVu Sans，授權見 `assets/fonts/DejaVuSans-LICENSE.txt`）
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// 在畫布上繪製單行文字
///
/// `(x, y)` 為文字方塊的左上角。
pub trait TextPainter: Send + Sync {
    fn draw_text(&self, canvas: &mut DynamicImage, x: i32, y: i32, colour: Rgba<u8>, text: &str);
}

/// 以 TrueType/OpenType 字型繪製文字
#[derive(Debug, Clone)]
pub struct TrueTypePainter {
    font: FontArc,
    scale: PxScale,
    source: String,
}

impl TrueTypePainter {
    pub fn load(spec: &FontSpec) -> SheetResult<Self> {
        match &spec.file {
            Some(path) => Self::from_file(path, spec.size),
            None => Self::bundled(spec.size),
        }
    }

    pub fn from_file(path: &Path, size: f32) -> SheetResult<Self> {
        let data = fs::read(path)
            .map_err(|e| SheetError::FontUnavailable(format!("{}: {e}", path.display())))?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| SheetError::FontUnavailable(format!("{}: {e}", path.display())))?;

        debug!("載入字型 {} ({size}px)", path.display());

        Ok(Self {
            font,
            scale: PxScale::from(size),
            source: path.display().to_string(),
        })
    }

    pub fn bundled(size: f32) -> SheetResult<Self> {
        let font = FontArc::try_from_slice(BUNDLED_FONT)
            .map_err(|e| SheetError::FontUnavailable(format!("內建字型: {e}")))?;

        Ok(Self {
            font,
            scale: PxScale::from(size),
            source: "內建 DejaVu Sans".to_string(),
        })
    }

    /// 字型來源（檔案路徑或內建字型名稱）
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl TextPainter for TrueTypePainter {
    fn draw_text(&self, canvas: &mut DynamicImage, x: i32, y: i32, colour: Rgba<u8>, text: &str) {
        let scaled = self.font.as_scaled(self.scale);
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);

        let mut caret = point(x as f32, y as f32 + scaled.ascent());
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let glyph_id = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                caret.x += scaled.kern(previous, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(self.scale, caret);
            caret.x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();

            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                let existing = canvas.get_pixel(px, py);
                canvas.put_pixel(px, py, blend(existing, colour, coverage));
            });
        }
    }
}

/// 依字形覆蓋率混合墨色與底色（含透明通道）
fn blend(base: Rgba<u8>, ink: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let coverage = coverage.clamp(0.0, 1.0);
    let mut out = base;
    for (channel, ink_channel) in out.0.iter_mut().zip(ink.0) {
        let mixed = f32::from(*channel) * (1.0 - coverage) + f32::from(ink_channel) * coverage;
        *channel = mixed.round().clamp(0.0, 255.0) as u8;
    }
    out
}
