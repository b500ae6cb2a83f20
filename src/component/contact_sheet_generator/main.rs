use super::sheet_assembler::SheetAssembler;
use super::video_descriptor::VideoDescriptor;
use crate::config::save::{add_recent_path, save_settings};
use crate::config::{Config, SheetOptions};
use crate::error::{SheetError, SheetResult};
use crate::tools::{
    Ffmpeg, FrameDecoder, TextPainter, TrueTypePainter, VideoFileInfo, ensure_directory_exists,
    ensure_writable, plan_output_paths, resolve_output_path, save_image, scan_video_files,
    validate_directory_exists,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 預覽圖生成結果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationResult {
    pub total_videos: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

enum VideoOutcome {
    Created(PathBuf),
    Skipped(String),
    Failed(anyhow::Error),
}

/// 預覽圖生成器
///
/// 每部影片各自走完 開啟 → 擷取 → 縮放 → 網格 → 標頭 → 拼接 → 存檔，
/// 批次模式下多部影片同時在 rayon 執行緒池上處理。
pub struct ContactSheetGenerator {
    options: SheetOptions,
    decoder: Arc<dyn FrameDecoder>,
    painter: Arc<dyn TextPainter>,
    shutdown_signal: Arc<AtomicBool>,
    overwrite: bool,
}

impl ContactSheetGenerator {
    pub fn new(
        options: SheetOptions,
        decoder: Arc<dyn FrameDecoder>,
        painter: Arc<dyn TextPainter>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            options: options.validated(),
            decoder,
            painter,
            shutdown_signal,
            overwrite: false,
        }
    }

    /// 以 ffmpeg 與 TrueType 字型建立生成器
    pub fn from_options(options: SheetOptions, shutdown_signal: Arc<AtomicBool>) -> Result<Self> {
        let decoder = Ffmpeg::new(&options.decoder.program, options.decoder.timeout());
        let painter = TrueTypePainter::load(&options.font).context("無法載入標頭與時間標籤用的字型")?;
        info!("使用字型: {}", painter.source());

        Ok(Self::new(
            options,
            Arc::new(decoder),
            Arc::new(painter),
            shutdown_signal,
        ))
    }

    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &SheetOptions {
        &self.options
    }

    /// 為單一影片產生預覽圖並寫入 `output_path`
    pub fn generate(&self, video_path: &Path, output_path: &Path) -> SheetResult<PathBuf> {
        ensure_writable(output_path, self.overwrite)?;

        let video = VideoDescriptor::open(video_path, Arc::clone(&self.decoder))?;
        let mut assembler =
            SheetAssembler::new(video, self.options.clone(), Arc::clone(&self.painter));
        let sheet = assembler.assemble_with(self.options.sampling)?;

        save_image(sheet, output_path, self.options.output_format)?;
        info!("預覽圖已建立: {}", output_path.display());

        Ok(output_path.to_path_buf())
    }

    pub fn run_single(&self, video_path: &Path, output_path: &Path) -> Result<()> {
        println!(
            "{} {}",
            style("處理中").cyan(),
            style(video_path.display()).bold()
        );
        println!("  {}", style(format!("取樣方式: {}", self.options.sampling)).dim());

        let created = self
            .generate(video_path, output_path)
            .with_context(|| format!("無法產生預覽圖: {}", video_path.display()))?;

        println!(
            "  {} 預覽圖已建立: {}",
            style("✓").green(),
            created.display()
        );
        Ok(())
    }

    /// 處理資料夾內所有影片；`output_dir` 為 `None` 時預覽圖放在影片旁邊
    pub fn run_batch(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        recursive: bool,
    ) -> Result<GenerationResult> {
        validate_directory_exists(input_dir)?;
        if let Some(output_dir) = output_dir {
            ensure_directory_exists(output_dir).with_context(|| {
                format!("無法建立輸出資料夾: {}", output_dir.display())
            })?;
        }

        println!("{}", style("掃描影片檔案中...").dim());
        let video_files = scan_video_files(input_dir, recursive)?;

        if video_files.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(GenerationResult::default());
        }

        println!(
            "{}",
            style(format!("找到 {} 個影片檔案", video_files.len())).green()
        );
        for (index, file) in video_files.iter().enumerate() {
            let size_mb = file.size as f64 / 1024.0 / 1024.0;
            println!(
                "  {}. {} ({:.2} MB)",
                index + 1,
                file.path.display(),
                size_mb
            );
        }

        println!();
        println!("{}", style("開始生成預覽圖...").cyan());

        let result = self.process_videos(&video_files, input_dir, output_dir);
        self.print_summary(&result);

        Ok(result)
    }

    /// 同時處理多部影片，單一影片失敗不影響其他影片
    ///
    /// 輸出路徑在開始前一次決定（見 [`plan_output_paths`]），不同影片不會寫到同一個檔案。
    pub fn process_videos(
        &self,
        videos: &[VideoFileInfo],
        input_dir: &Path,
        output_dir: Option<&Path>,
    ) -> GenerationResult {
        let sources: Vec<&Path> = videos.iter().map(|video| video.path.as_path()).collect();
        let targets = plan_output_paths(&sources, input_dir, output_dir, self.options.output_format);

        let progress_bar = ProgressBar::new(videos.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        progress_bar.set_message("生成預覽圖中...");

        let outcomes: Vec<VideoOutcome> = videos
            .par_iter()
            .zip(&targets)
            .map(|(video, output_path)| {
                let outcome = self.process_single_video(&video.path, output_path);
                match &outcome {
                    VideoOutcome::Created(path) => progress_bar.println(format!(
                        "  {} {}",
                        style("✓").green(),
                        path.display()
                    )),
                    VideoOutcome::Skipped(reason) => progress_bar.println(format!(
                        "  {} {} ({reason})",
                        style("⤳").dim(),
                        video.path.display()
                    )),
                    VideoOutcome::Failed(e) => {
                        error!("處理影片失敗 {}: {e:#}", video.path.display());
                        progress_bar.println(format!(
                            "  {} {}: {e:#}",
                            style("✗").red(),
                            video.path.display()
                        ));
                    }
                }
                progress_bar.inc(1);
                outcome
            })
            .collect();

        progress_bar.finish_with_message("完成");

        let mut result = GenerationResult {
            total_videos: videos.len(),
            ..GenerationResult::default()
        };
        for outcome in &outcomes {
            match outcome {
                VideoOutcome::Created(_) => result.successful += 1,
                VideoOutcome::Skipped(_) => result.skipped += 1,
                VideoOutcome::Failed(_) => result.failed += 1,
            }
        }
        result
    }

    fn process_single_video(&self, video_path: &Path, output_path: &Path) -> VideoOutcome {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return VideoOutcome::Skipped("收到中斷訊號".to_string());
        }

        if let Some(parent) = output_path.parent() {
            if let Err(e) = ensure_directory_exists(parent) {
                return VideoOutcome::Failed(
                    e.context(format!("無法建立輸出資料夾: {}", parent.display())),
                );
            }
        }

        match self.generate(video_path, output_path) {
            Ok(path) => VideoOutcome::Created(path),
            Err(SheetError::OutputExists(_)) => VideoOutcome::Skipped("預覽圖已存在".to_string()),
            Err(e) => VideoOutcome::Failed(anyhow::Error::new(e)),
        }
    }

    /// 互動模式：選擇輸入路徑與輸出資料夾，並記錄最近使用的路徑
    pub fn run_interactive(&self, config: &mut Config) -> Result<()> {
        println!("{}", style("=== 影片預覽圖生成 ===").cyan().bold());

        let Some(input_path) = self.prompt_input_path(config)? else {
            return Ok(());
        };
        let input = PathBuf::from(&input_path);
        if !input.exists() {
            anyhow::bail!("路徑不存在: {}", input.display());
        }

        let output_dir = self.prompt_output_dir()?;

        add_recent_path(&mut config.settings, &input_path);
        if let Err(e) = save_settings(&config.settings) {
            warn!("無法儲存設定: {e:#}");
        }

        if input.is_dir() {
            let recursive = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("是否包含子資料夾？")
                .default(true)
                .interact()?;
            self.run_batch(&input, output_dir.as_deref(), recursive)?;
        } else {
            if let Some(output_dir) = &output_dir {
                ensure_directory_exists(output_dir)?;
            }
            let output_path =
                resolve_output_path(&input, output_dir.as_deref(), self.options.output_format);
            self.run_single(&input, &output_path)?;
        }

        Ok(())
    }

    fn prompt_input_path(&self, config: &Config) -> Result<Option<String>> {
        let recent_paths = &config.settings.recent_paths;

        if recent_paths.is_empty() {
            let path: String = Input::new()
                .with_prompt("請輸入影片檔或資料夾路徑")
                .interact_text()?;
            return Ok(Some(path.trim().to_string()));
        }

        let mut options: Vec<String> = recent_paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let indicator = if Path::new(p).exists() { "✓" } else { "✗" };
                format!("{} [{}] {}", i + 1, indicator, p)
            })
            .collect();
        options.push("輸入新路徑...".to_string());

        println!("{}", style("(按 ESC 離開)").dim());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇路徑")
            .items(&options)
            .default(0)
            .interact_opt()?;

        match selection {
            None => Ok(None),
            Some(idx) if idx < recent_paths.len() => Ok(Some(recent_paths[idx].clone())),
            Some(_) => {
                let path: String = Input::new()
                    .with_prompt("請輸入影片檔或資料夾路徑")
                    .interact_text()?;
                Ok(Some(path.trim().to_string()))
            }
        }
    }

    fn prompt_output_dir(&self) -> Result<Option<PathBuf>> {
        let path: String = Input::new()
            .with_prompt("請輸入預覽圖輸出資料夾（留空則放在影片旁邊）")
            .allow_empty(true)
            .interact_text()?;
        let path = path.trim();
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }

    fn print_summary(&self, result: &GenerationResult) {
        println!();
        println!("{}", style("=== 預覽圖生成摘要 ===").cyan().bold());
        println!("  總計: {} 個影片", result.total_videos);
        println!("  成功: {} 個", style(result.successful).green());

        if result.skipped > 0 {
            println!("  跳過: {} 個", style(result.skipped).yellow());
        }

        if result.failed > 0 {
            println!("  失敗: {} 個", style(result.failed).red());
        }

        info!(
            "預覽圖生成完成 - 成功: {}, 跳過: {}, 失敗: {}",
            result.successful, result.skipped, result.failed
        );
    }
}
