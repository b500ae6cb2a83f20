use crate::config::{FailurePolicy, FontSpec, OutputFormat, SamplingMode, SheetOptions};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// 從影片擷取縮圖並產生附帶檔案資訊的預覽圖
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 影片檔或資料夾；省略時進入互動模式
    pub input: Option<PathBuf>,

    /// 輸出檔案或資料夾
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 每隔幾秒擷取一張
    #[arg(short, long, value_name = "SEC", conflicts_with = "number")]
    pub interval: Option<u64>,

    /// 總共擷取幾張（預設 20）
    #[arg(short, long, value_name = "NUM")]
    pub number: Option<usize>,

    /// 網格欄數（預設 5）
    #[arg(short = 'c', long = "column", value_name = "COLS")]
    pub columns: Option<u32>,

    /// 不在縮圖上標示時間
    #[arg(long)]
    pub notime: bool,

    /// 標頭高度（至少 85）
    #[arg(long = "header", value_name = "PX")]
    pub header_height: Option<u32>,

    /// 縮圖最大寬高
    #[arg(short = 't', long = "thumbsize", num_args = 2, value_names = ["W", "H"])]
    pub thumb_size: Option<Vec<u32>>,

    /// 文字顏色 RGBA
    #[arg(
        long = "text-colour",
        visible_alias = "textcolour",
        num_args = 4,
        value_names = ["R", "G", "B", "A"]
    )]
    pub text_colour: Option<Vec<u8>>,

    /// 背景顏色 RGBA
    #[arg(long = "bgcolour", num_args = 4, value_names = ["R", "G", "B", "A"])]
    pub background_colour: Option<Vec<u8>>,

    /// 字型檔與字級
    #[arg(long, num_args = 2, value_names = ["FILE", "SIZE"])]
    pub font: Option<Vec<String>>,

    /// 輸出格式
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// 覆寫已存在的預覽圖
    #[arg(long)]
    pub overwrite: bool,

    /// 處理資料夾及其子資料夾中的所有影片
    #[arg(short, long)]
    pub recursive: bool,

    /// 任一畫面擷取失敗即放棄該影片
    #[arg(long)]
    pub strict: bool,

    /// 逐一擷取畫面，不平行處理
    #[arg(long)]
    pub sequential: bool,

    /// ffmpeg 執行檔路徑
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<String>,

    /// 單次 ffmpeg 呼叫的逾時秒數，0 表示不限制
    #[arg(long, value_name = "SEC")]
    pub timeout: Option<u64>,

    /// 將本次參數存為預設值
    #[arg(long)]
    pub save_settings: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 以命令列參數覆蓋 `base` 中對應的設定，回傳驗證後的結果
    pub fn apply_to(&self, base: SheetOptions) -> Result<SheetOptions> {
        let mut options = base;

        if let Some(interval) = self.interval {
            if interval == 0 {
                bail!("擷取間隔必須大於 0 秒");
            }
            options.sampling = SamplingMode::ByInterval(interval);
        }
        if let Some(number) = self.number {
            if number == 0 {
                bail!("縮圖數量必須至少為 1");
            }
            options.sampling = SamplingMode::ByCount(number);
        }
        if let Some(columns) = self.columns {
            options.columns = columns;
        }
        if self.notime {
            options.show_timestamp = false;
        }
        if let Some(header_height) = self.header_height {
            options.header_height = header_height;
        }
        if let Some([width, height]) = self.thumb_size.as_deref().map(pair).transpose()? {
            options.max_thumb_size = (width, height);
        }
        if let Some(colour) = self.text_colour.as_deref().map(rgba).transpose()? {
            options.text_colour = colour;
        }
        if let Some(colour) = self.background_colour.as_deref().map(rgba).transpose()? {
            options.background_colour = colour;
        }
        if let Some(font) = &self.font {
            options.font = parse_font(font)?;
        }
        if let Some(format) = self.format {
            options.output_format = format;
        }
        if self.strict {
            options.failure_policy = FailurePolicy::Strict;
        }
        if self.sequential {
            options.parallel_extraction = false;
        }
        if let Some(program) = &self.ffmpeg {
            options.decoder.program.clone_from(program);
        }
        if let Some(timeout) = self.timeout {
            options.decoder.timeout_secs = timeout;
        }

        Ok(options.validated())
    }
}

fn pair(values: &[u32]) -> Result<[u32; 2]> {
    values
        .try_into()
        .map_err(|_| anyhow::anyhow!("需要 2 個數值，收到 {}", values.len()))
}

fn rgba(values: &[u8]) -> Result<[u8; 4]> {
    values
        .try_into()
        .map_err(|_| anyhow::anyhow!("顏色需要 4 個數值 (R G B A)，收到 {}", values.len()))
}

fn parse_font(values: &[String]) -> Result<FontSpec> {
    let [file, size] = values else {
        bail!("--font 需要字型檔與字級兩個參數");
    };
    let size: f32 = size
        .parse()
        .with_context(|| format!("無效的字級: {size}"))?;
    if size.is_nan() || size <= 0.0 {
        bail!("字級必須大於 0: {size}");
    }

    Ok(FontSpec {
        file: Some(PathBuf::from(file)),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("video_contact_sheet").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = parse(&["movie.mp4"]);
        let options = args.apply_to(SheetOptions::default()).unwrap();
        assert_eq!(options, SheetOptions::default());
        assert_eq!(args.input, Some(PathBuf::from("movie.mp4")));
    }

    #[test]
    fn test_no_input_means_interactive() {
        let args = parse(&[]);
        assert!(args.input.is_none());
    }

    #[test]
    fn test_sampling_flags() {
        let options = parse(&["m.mp4", "-i", "30"])
            .apply_to(SheetOptions::default())
            .unwrap();
        assert_eq!(options.sampling, SamplingMode::ByInterval(30));

        let options = parse(&["m.mp4", "-n", "12"])
            .apply_to(SheetOptions::default())
            .unwrap();
        assert_eq!(options.sampling, SamplingMode::ByCount(12));
    }

    #[test]
    fn test_interval_conflicts_with_number() {
        let result =
            Args::try_parse_from(["video_contact_sheet", "m.mp4", "-i", "30", "-n", "12"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(parse(&["m.mp4", "-n", "0"]).apply_to(SheetOptions::default()).is_err());
        assert!(parse(&["m.mp4", "-i", "0"]).apply_to(SheetOptions::default()).is_err());
    }

    #[test]
    fn test_layout_and_colour_flags() {
        let options = parse(&[
            "m.mp4",
            "-c",
            "0",
            "--header",
            "40",
            "-t",
            "320",
            "180",
            "--text-colour",
            "255",
            "255",
            "0",
            "255",
            "--bgcolour",
            "10",
            "20",
            "30",
            "255",
            "--notime",
        ])
        .apply_to(SheetOptions::default())
        .unwrap();

        assert_eq!(options.columns, 1);
        assert_eq!(options.header_height, 85);
        assert_eq!(options.max_thumb_size, (320, 180));
        assert_eq!(options.text_colour, [255, 255, 0, 255]);
        assert_eq!(options.background_colour, [10, 20, 30, 255]);
        assert!(!options.show_timestamp);
    }

    #[test]
    fn test_textcolour_alias() {
        let options = parse(&["m.mp4", "--textcolour", "1", "2", "3", "4"])
            .apply_to(SheetOptions::default())
            .unwrap();
        assert_eq!(options.text_colour, [1, 2, 3, 4]);
    }

    #[test]
    fn test_font_and_decoder_flags() {
        let options = parse(&[
            "m.mp4",
            "--font",
            "/fonts/Sans.ttf",
            "18",
            "--format",
            "png",
            "--strict",
            "--sequential",
            "--ffmpeg",
            "/opt/ffmpeg",
            "--timeout",
            "5",
        ])
        .apply_to(SheetOptions::default())
        .unwrap();

        assert_eq!(options.font.file, Some(PathBuf::from("/fonts/Sans.ttf")));
        assert!((options.font.size - 18.0).abs() < f32::EPSILON);
        assert_eq!(options.output_format, OutputFormat::Png);
        assert_eq!(options.failure_policy, FailurePolicy::Strict);
        assert!(!options.parallel_extraction);
        assert_eq!(options.decoder.program, "/opt/ffmpeg");
        assert_eq!(options.decoder.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_font_size() {
        let result = parse(&["m.mp4", "--font", "/fonts/Sans.ttf", "big"])
            .apply_to(SheetOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_saved_settings() {
        let saved = SheetOptions {
            columns: 8,
            sampling: SamplingMode::ByInterval(60),
            ..SheetOptions::default()
        };
        let options = parse(&["m.mp4", "-n", "4"]).apply_to(saved).unwrap();
        assert_eq!(options.columns, 8);
        assert_eq!(options.sampling, SamplingMode::ByCount(4));
    }

    #[test]
    fn test_wrong_colour_arity_rejected_by_parser() {
        let result =
            Args::try_parse_from(["video_contact_sheet", "m.mp4", "--bgcolour", "1", "2"]);
        assert!(result.is_err());
    }
}
