use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_RECENT_PATHS: usize = 10;

/// 標頭最小高度：四行文字（10、30、50、70 px）需要的空間
pub const MIN_HEADER_HEIGHT: u32 = 85;
pub const DEFAULT_HEADER_HEIGHT: u32 = 100;
pub const DEFAULT_GRID_COLUMNS: u32 = 5;
pub const DEFAULT_THUMBNAIL_COUNT: usize = 20;
pub const DEFAULT_MAX_THUMB_SIZE: (u32, u32) = (220, 220);
pub const DEFAULT_FONT_SIZE: f32 = 15.0;
pub const DEFAULT_DECODER_TIMEOUT_SECS: u64 = 60;

/// 縮圖取樣方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// 每隔固定秒數擷取一張
    ByInterval(u64),
    /// 總共擷取指定張數，包含片頭與片尾
    ByCount(usize),
}

impl Default for SamplingMode {
    fn default() -> Self {
        Self::ByCount(DEFAULT_THUMBNAIL_COUNT)
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByInterval(seconds) => write!(f, "每 {seconds} 秒一張"),
            Self::ByCount(count) => write!(f, "共 {count} 張"),
        }
    }
}

/// 單一時間點擷取失敗時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 立即中止整部影片
    Strict,
    /// 略過該時間點並繼續
    #[default]
    Lenient,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Jpg,
    Png,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 字型檔與字級；未指定檔案時使用內建字型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub file: Option<PathBuf>,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            file: None,
            size: DEFAULT_FONT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderSettings {
    pub program: String,
    /// 單次 ffmpeg 呼叫的逾時秒數，0 表示不限制
    pub timeout_secs: u64,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            timeout_secs: DEFAULT_DECODER_TIMEOUT_SECS,
        }
    }
}

impl DecoderSettings {
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// 單次產生預覽圖的設定
///
/// 在呼叫端驗證一次後即不再變動。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub columns: u32,
    pub show_timestamp: bool,
    pub background_colour: [u8; 4],
    pub text_colour: [u8; 4],
    pub max_thumb_size: (u32, u32),
    pub header_height: u32,
    pub font: FontSpec,
    pub sampling: SamplingMode,
    pub failure_policy: FailurePolicy,
    pub parallel_extraction: bool,
    pub output_format: OutputFormat,
    pub decoder: DecoderSettings,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            show_timestamp: true,
            background_colour: [0, 0, 0, 0],
            text_colour: [255, 255, 255, 0],
            max_thumb_size: DEFAULT_MAX_THUMB_SIZE,
            header_height: DEFAULT_HEADER_HEIGHT,
            font: FontSpec::default(),
            sampling: SamplingMode::default(),
            failure_policy: FailurePolicy::default(),
            parallel_extraction: true,
            output_format: OutputFormat::default(),
            decoder: DecoderSettings::default(),
        }
    }
}

impl SheetOptions {
    /// 將超出範圍的數值夾回下限：欄數至少 1、標頭至少 85 px、縮圖上限至少 1 px
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.columns = self.columns.max(1);
        self.header_height = self.header_height.max(MIN_HEADER_HEIGHT);
        self.max_thumb_size = (self.max_thumb_size.0.max(1), self.max_thumb_size.1.max(1));
        self
    }

    #[must_use]
    pub const fn background(&self) -> Rgba<u8> {
        Rgba(self.background_colour)
    }

    #[must_use]
    pub const fn text(&self) -> Rgba<u8> {
        Rgba(self.text_colour)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub sheet: SheetOptions,
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
