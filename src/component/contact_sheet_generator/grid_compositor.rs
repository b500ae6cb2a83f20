use super::video_descriptor::Thumbnail;
use crate::error::{SheetError, SheetResult};
use crate::tools::{PixelMode, TextPainter, format_timestamp, paste};
use image::{DynamicImage, Rgba};

/// 縮圖網格的欄數與格子尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub thumb_size: (u32, u32),
}

impl GridLayout {
    #[must_use]
    pub const fn new(columns: u32, thumb_size: (u32, u32)) -> Self {
        Self {
            columns: if columns == 0 { 1 } else { columns },
            thumb_size,
        }
    }

    #[must_use]
    pub fn rows(&self, count: usize) -> u32 {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        count.div_ceil(self.columns)
    }

    /// 網格畫布尺寸；超出 `u32` 時回傳 `None`
    #[must_use]
    pub fn canvas_size(&self, count: usize) -> Option<(u32, u32)> {
        let (width, height) = self.thumb_size;
        Some((
            width.checked_mul(self.columns)?,
            height.checked_mul(self.rows(count))?,
        ))
    }

    /// 第 `index` 格的左上角座標（由左至右、由上而下）
    #[must_use]
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        let (width, height) = self.thumb_size;
        (
            (index % self.columns).saturating_mul(width),
            (index / self.columns).saturating_mul(height),
        )
    }
}

/// 在每格左上角標上時間
#[derive(Clone, Copy)]
pub struct TimestampLabels<'a> {
    pub painter: &'a dyn TextPainter,
    pub colour: Rgba<u8>,
}

pub fn compose_grid(
    thumbnails: &[Thumbnail],
    layout: GridLayout,
    pixel_mode: PixelMode,
    background: Rgba<u8>,
    labels: Option<TimestampLabels<'_>>,
) -> SheetResult<DynamicImage> {
    if thumbnails.is_empty() {
        return Err(SheetError::NoThumbnails);
    }

    let Some((width, height)) = layout.canvas_size(thumbnails.len()) else {
        return Err(SheetError::CanvasTooLarge {
            columns: layout.columns,
            rows: layout.rows(thumbnails.len()),
        });
    };
    let mut canvas = pixel_mode.filled(width, height, background);

    for (index, thumbnail) in thumbnails.iter().enumerate() {
        let (x, y) = layout.cell_origin(index);
        paste(&mut canvas, &thumbnail.image, i64::from(x), i64::from(y));

        if let Some(labels) = labels {
            labels.painter.draw_text(
                &mut canvas,
                x as i32,
                y as i32,
                labels.colour,
                &format_timestamp(thumbnail.timestamp),
            );
        }
    }

    Ok(canvas)
}
