// 每個測試檔只會用到部分輔助函式
#![allow(unused)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, Rgba};
use video_contact_sheet::SheetError;
use video_contact_sheet::error::SheetResult;
use video_contact_sheet::tools::{FrameDecoder, PixelMode, TextPainter};

/// 不需要 ffmpeg 的畫面來源：紅色通道為時間點，超出片尾即失敗
pub struct FakeDecoder {
    pub resolution: (u32, u32),
    pub duration: u64,
    pub failing: HashSet<u64>,
    pub calls: Mutex<Vec<u64>>,
}

impl FakeDecoder {
    pub fn new(width: u32, height: u32, duration: u64) -> Self {
        Self {
            resolution: (width, height),
            duration,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at(mut self, timestamps: &[u64]) -> Self {
        self.failing.extend(timestamps);
        self
    }
}

impl FrameDecoder for FakeDecoder {
    fn extract_frame(&self, path: &Path, timestamp: u64) -> SheetResult<DynamicImage> {
        self.calls.lock().unwrap().push(timestamp);
        if timestamp > self.duration || self.failing.contains(&timestamp) {
            return Err(SheetError::InvalidFrame {
                path: path.to_path_buf(),
                timestamp,
                reason: "fake decoder".to_string(),
            });
        }
        let (width, height) = self.resolution;
        Ok(PixelMode::Rgb8.filled(width, height, Rgba([(timestamp % 256) as u8, 0, 0, 255])))
    }

    fn probe_duration(&self, _path: &Path) -> SheetResult<u64> {
        Ok(self.duration)
    }
}

/// 不繪製任何東西，只記錄文字
#[derive(Default)]
pub struct RecordingPainter {
    pub texts: Mutex<Vec<String>>,
}

impl TextPainter for RecordingPainter {
    fn draw_text(&self, _canvas: &mut DynamicImage, _x: i32, _y: i32, _colour: Rgba<u8>, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }
}

/// 建立指定大小的假影片檔
pub fn fake_video(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; size]).unwrap();
    path
}
