use crate::config::OutputFormat;
use crate::error::SheetResult;
use image::imageops::{FilterType, replace};
use image::{ColorType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::debug;
use std::path::Path;

/// 影像的像素格式（通道配置與位元深度）
///
/// 由探測幀決定，之後建立的網格、標頭與最終預覽圖都沿用同一格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    L8,
    La8,
    Rgb8,
    Rgba8,
    L16,
    La16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
}

impl PixelMode {
    #[must_use]
    pub fn of(image: &DynamicImage) -> Self {
        match image.color() {
            ColorType::L8 => Self::L8,
            ColorType::La8 => Self::La8,
            ColorType::Rgb8 => Self::Rgb8,
            ColorType::Rgba8 => Self::Rgba8,
            ColorType::L16 => Self::L16,
            ColorType::La16 => Self::La16,
            ColorType::Rgb16 => Self::Rgb16,
            ColorType::Rgba16 => Self::Rgba16,
            ColorType::Rgb32F => Self::Rgb32F,
            ColorType::Rgba32F => Self::Rgba32F,
            _ => Self::Rgba8,
        }
    }

    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::La8 | Self::Rgba8 | Self::La16 | Self::Rgba16 | Self::Rgba32F
        )
    }

    /// 轉換為此像素格式；格式相同時原樣回傳
    #[must_use]
    pub fn convert(self, image: DynamicImage) -> DynamicImage {
        if Self::of(&image) == self {
            return image;
        }

        match self {
            Self::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
            Self::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
            Self::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
            Self::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
            Self::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
            Self::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
            Self::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
            Self::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
            Self::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
            Self::Rgba32F => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        }
    }

    /// 建立以 `colour` 填滿的畫布
    #[must_use]
    pub fn filled(self, width: u32, height: u32, colour: Rgba<u8>) -> DynamicImage {
        self.convert(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width, height, colour,
        )))
    }
}

/// 計算在 `max_size` 範圍內、保持長寬比的尺寸
///
/// 不會放大：原尺寸已在範圍內時原樣回傳。
#[must_use]
pub fn fit_within(size: (u32, u32), max_size: (u32, u32)) -> (u32, u32) {
    let (width, height) = size;
    let (max_width, max_height) = max_size;

    if width <= max_width && height <= max_height {
        return size;
    }

    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height));
    let fitted_width = (f64::from(width) * scale).round().max(1.0) as u32;
    let fitted_height = (f64::from(height) * scale).round().max(1.0) as u32;

    (fitted_width.min(max_width.max(1)), fitted_height.min(max_height.max(1)))
}

/// 就地縮小影像使其符合 `max_size`，保持長寬比與像素格式
///
/// 回傳是否有實際縮放。
pub fn shrink_to_fit(image: &mut DynamicImage, max_size: (u32, u32)) -> bool {
    let size = (image.width(), image.height());
    let (width, height) = fit_within(size, max_size);

    if (width, height) == size {
        return false;
    }

    *image = image.resize_exact(width, height, FilterType::Triangle);
    true
}

/// 將 `tile` 以左上角 `(x, y)` 貼到 `canvas` 上，超出範圍的部分裁掉
///
/// 兩者像素格式相同時直接複製原始資料，不經過 8 位元 RGBA 轉換。
pub fn paste(canvas: &mut DynamicImage, tile: &DynamicImage, x: i64, y: i64) {
    let canvas_mode = PixelMode::of(canvas);
    let converted;
    let tile = if PixelMode::of(tile) == canvas_mode {
        tile
    } else {
        converted = canvas_mode.convert(tile.clone());
        &converted
    };

    match (canvas, tile) {
        (DynamicImage::ImageLuma8(c), DynamicImage::ImageLuma8(t)) => replace(c, t, x, y),
        (DynamicImage::ImageLumaA8(c), DynamicImage::ImageLumaA8(t)) => replace(c, t, x, y),
        (DynamicImage::ImageRgb8(c), DynamicImage::ImageRgb8(t)) => replace(c, t, x, y),
        (DynamicImage::ImageRgba8(c), DynamicImage::ImageRgba8(t)) => replace(c, t, x, y),
        (DynamicImage::ImageLuma16(c), DynamicImage::ImageLuma16(t)) => replace(c, t, x, y),
        (DynamicImage::ImageLumaA16(c), DynamicImage::ImageLumaA16(t)) => replace(c, t, x, y),
        (DynamicImage::ImageRgb16(c), DynamicImage::ImageRgb16(t)) => replace(c, t, x, y),
        (DynamicImage::ImageRgba16(c), DynamicImage::ImageRgba16(t)) => replace(c, t, x, y),
        (DynamicImage::ImageRgb32F(c), DynamicImage::ImageRgb32F(t)) => replace(c, t, x, y),
        (DynamicImage::ImageRgba32F(c), DynamicImage::ImageRgba32F(t)) => replace(c, t, x, y),
        (canvas, tile) => replace(canvas, tile, x, y),
    }
}

/// 依輸出格式儲存影像
///
/// JPEG 不支援透明通道與高位元深度，儲存前轉為 RGB8；
/// PNG 保留原本的像素格式（浮點格式轉為 16 位元）。
pub fn save_image(image: &DynamicImage, path: &Path, format: OutputFormat) -> SheetResult<()> {
    let mode = PixelMode::of(image);
    debug!("儲存 {:?} {:?} 影像: {}", format, mode, path.display());

    match format {
        OutputFormat::Jpg => match mode {
            PixelMode::L8 | PixelMode::Rgb8 => image.save_with_format(path, ImageFormat::Jpeg)?,
            _ => DynamicImage::ImageRgb8(image.to_rgb8())
                .save_with_format(path, ImageFormat::Jpeg)?,
        },
        OutputFormat::Png => match mode {
            PixelMode::Rgb32F => PixelMode::Rgb16
                .convert(image.clone())
                .save_with_format(path, ImageFormat::Png)?,
            PixelMode::Rgba32F => PixelMode::Rgba16
                .convert(image.clone())
                .save_with_format(path, ImageFormat::Png)?,
            _ => image.save_with_format(path, ImageFormat::Png)?,
        },
    }

    Ok(())
}
