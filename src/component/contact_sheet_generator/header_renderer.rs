use super::video_descriptor::VideoDescriptor;
use crate::tools::{PixelMode, TextPainter, format_timestamp};
use image::{DynamicImage, Rgba};

const TEXT_LEFT: i32 = 10;
const LINE_OFFSETS: [i32; 4] = [10, 30, 50, 70];

/// 標頭的四行文字：檔名、大小、解析度、長度
#[must_use]
pub fn header_lines(
    file_name: &str,
    file_size_mb: f64,
    resolution: (u32, u32),
    duration_seconds: u64,
) -> [String; 4] {
    [
        format!("File Name: {file_name}"),
        format!("File Size: {file_size_mb:.6} MB"),
        format!("Resolution: {}x{}", resolution.0, resolution.1),
        format!("Duration: {}", format_timestamp(duration_seconds)),
    ]
}

/// 繪製影片資訊標頭
///
/// 不檢查 `header_height` 是否容得下四行文字，由呼叫端負責。
#[must_use]
pub fn compose_header(
    video: &VideoDescriptor,
    width: u32,
    header_height: u32,
    pixel_mode: PixelMode,
    background: Rgba<u8>,
    text_colour: Rgba<u8>,
    painter: &dyn TextPainter,
) -> DynamicImage {
    let mut header = pixel_mode.filled(width, header_height, background);

    let lines = header_lines(
        &video.file_name(),
        video.file_size_mb(),
        video.resolution(),
        video.duration_seconds(),
    );

    for (line, y) in lines.iter().zip(LINE_OFFSETS) {
        painter.draw_text(&mut header, TEXT_LEFT, y, text_colour, line);
    }

    header
}
