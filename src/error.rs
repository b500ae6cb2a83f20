//! 預覽圖管線的錯誤型別
//!
//! 核心流程（擷取、縮放、排版、組合）回傳 [`SheetError`]；
//! 應用層（互動介面、批次處理）則以 `anyhow` 加上前後文包裝。

use crate::component::contact_sheet_generator::SheetStage;
use std::io::Error as IoError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    /// 第 0 秒的探測幀無法解碼，視為非影片檔案
    #[error("無法讀取影片 {path}: {reason}")]
    UnreadableVideo { path: PathBuf, reason: String },

    /// 解碼器輸出中找不到 `Duration: HH:MM:SS.ff,`
    #[error("無法解析影片長度: {path}")]
    UnparsableDuration { path: PathBuf },

    /// 單一時間點擷取失敗（超出片尾、毀損區段、解碼失敗）
    #[error("無法擷取 {path} 於 {timestamp}s 的畫面: {reason}")]
    InvalidFrame {
        path: PathBuf,
        timestamp: u64,
        reason: String,
    },

    #[error("ffmpeg 擷取 {path} 於 {timestamp}s 的畫面逾時 ({timeout:?})")]
    DecoderTimeout {
        path: PathBuf,
        timestamp: u64,
        timeout: Duration,
    },

    /// 探測影片長度時解碼器沒有在期限內結束
    #[error("ffmpeg 探測 {path} 的影片長度逾時 ({timeout:?})")]
    ProbeTimeout { path: PathBuf, timeout: Duration },

    #[error("無法執行解碼器 {program}: {source}")]
    DecoderUnavailable {
        program: String,
        #[source]
        source: IoError,
    },

    /// 組合步驟呼叫順序錯誤
    #[error("步驟順序錯誤: 需要處於 {expected:?} 階段，目前為 {actual:?}")]
    OrderingViolation {
        expected: SheetStage,
        actual: SheetStage,
    },

    #[error("縮圖數量必須至少為 1，收到 {0}")]
    InvalidCount(usize),

    #[error("擷取間隔必須大於 0 秒")]
    InvalidInterval,

    #[error("沒有任何縮圖可供排版")]
    NoThumbnails,

    #[error("預覽圖尺寸過大: {columns} 欄 × {rows} 列")]
    CanvasTooLarge { columns: u32, rows: u32 },

    #[error("輸出檔案已存在: {0}")]
    OutputExists(PathBuf),

    #[error("無法載入字型: {0}")]
    FontUnavailable(String),

    #[error("I/O 錯誤: {0}")]
    Io(#[from] IoError),

    #[error("影像處理錯誤: {0}")]
    Image(#[from] image::ImageError),
}

impl SheetError {
    /// 是否為可略過的單幀失敗
    #[must_use]
    pub const fn is_frame_failure(&self) -> bool {
        matches!(self, Self::InvalidFrame { .. } | Self::DecoderTimeout { .. })
    }
}

pub type SheetResult<T> = Result<T, SheetError>;
