use crate::error::{SheetError, SheetResult};
use crate::tools::{FrameDecoder, PixelMode, TextPainter};
use image::{DynamicImage, Rgba};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// 不需要 ffmpeg 的畫面來源：每一幀為純色，紅色通道為時間點
pub(crate) struct SyntheticDecoder {
    resolution: (u32, u32),
    mode: PixelMode,
    duration: Option<u64>,
    failing: HashSet<u64>,
    calls: Mutex<Vec<u64>>,
}

impl SyntheticDecoder {
    pub(crate) fn new(width: u32, height: u32, duration: u64) -> Self {
        Self {
            resolution: (width, height),
            mode: PixelMode::Rgb8,
            duration: Some(duration),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_at(mut self, timestamps: &[u64]) -> Self {
        self.failing.extend(timestamps);
        self
    }

    pub(crate) fn with_mode(mut self, mode: PixelMode) -> Self {
        self.mode = mode;
        self
    }

    pub(crate) fn without_duration(mut self) -> Self {
        self.duration = None;
        self
    }

    pub(crate) fn calls(&self) -> Vec<u64> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_unstable();
        calls
    }
}

impl FrameDecoder for SyntheticDecoder {
    fn extract_frame(&self, path: &Path, timestamp: u64) -> SheetResult<DynamicImage> {
        self.calls.lock().unwrap().push(timestamp);

        let past_end = self.duration.is_some_and(|d| timestamp > d);
        if past_end || self.failing.contains(&timestamp) {
            return Err(SheetError::InvalidFrame {
                path: path.to_path_buf(),
                timestamp,
                reason: "synthetic failure".to_string(),
            });
        }

        let (width, height) = self.resolution;
        Ok(self
            .mode
            .filled(width, height, Rgba([(timestamp % 256) as u8, 0, 0, 255])))
    }

    fn probe_duration(&self, path: &Path) -> SheetResult<u64> {
        self.duration.ok_or_else(|| SheetError::UnparsableDuration {
            path: path.to_path_buf(),
        })
    }
}

/// 紀錄每次繪製的文字與位置
#[derive(Default)]
pub(crate) struct RecordingPainter {
    calls: Mutex<Vec<(i32, i32, String)>>,
}

impl RecordingPainter {
    pub(crate) fn calls(&self) -> Vec<(i32, i32, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl TextPainter for RecordingPainter {
    fn draw_text(&self, _canvas: &mut DynamicImage, x: i32, y: i32, _colour: Rgba<u8>, text: &str) {
        self.calls.lock().unwrap().push((x, y, text.to_string()));
    }
}

/// 建立指定大小的暫存影片檔（內容不重要，只用來取得檔案大小）
pub(crate) fn fake_video_file(dir: &Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; size]).unwrap();
    path
}
