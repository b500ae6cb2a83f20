use super::grid_compositor::{GridLayout, TimestampLabels, compose_grid};
use super::header_renderer::compose_header;
use super::video_descriptor::{VideoDescriptor, interval_timestamps};
use crate::config::{SamplingMode, SheetOptions};
use crate::error::{SheetError, SheetResult};
use crate::tools::{TextPainter, paste};
use image::DynamicImage;
use log::debug;
use std::sync::Arc;

/// 組合流程的階段，每一步都必須在前一步完成後才能執行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetStage {
    Uninitialized,
    Sampled,
    Resized,
    GridBuilt,
    HeaderBuilt,
    Assembled,
}

/// 將單一影片組合成預覽圖：擷取 → 縮放 → 網格 → 標頭 → 上下拼接
pub struct SheetAssembler {
    video: VideoDescriptor,
    options: SheetOptions,
    painter: Arc<dyn TextPainter>,
    stage: SheetStage,
    grid: Option<DynamicImage>,
    header: Option<DynamicImage>,
    sheet: Option<DynamicImage>,
}

impl SheetAssembler {
    #[must_use]
    pub fn new(video: VideoDescriptor, options: SheetOptions, painter: Arc<dyn TextPainter>) -> Self {
        Self {
            video,
            options,
            painter,
            stage: SheetStage::Uninitialized,
            grid: None,
            header: None,
            sheet: None,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> SheetStage {
        self.stage
    }

    #[must_use]
    pub const fn video(&self) -> &VideoDescriptor {
        &self.video
    }

    #[must_use]
    pub const fn grid(&self) -> Option<&DynamicImage> {
        self.grid.as_ref()
    }

    #[must_use]
    pub const fn header(&self) -> Option<&DynamicImage> {
        self.header.as_ref()
    }

    #[must_use]
    pub const fn sheet(&self) -> Option<&DynamicImage> {
        self.sheet.as_ref()
    }

    #[must_use]
    pub fn into_sheet(self) -> Option<DynamicImage> {
        self.sheet
    }

    fn require(&self, expected: SheetStage) -> SheetResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(SheetError::OrderingViolation {
                expected,
                actual: self.stage,
            })
        }
    }

    /// 回到初始狀態，清除縮圖與已建立的畫面
    pub fn reset(&mut self) {
        self.stage = SheetStage::Uninitialized;
        self.grid = None;
        self.header = None;
        self.sheet = None;
        self.video.clear_thumbnails();
    }

    pub fn sample(&mut self, timestamps: &[u64]) -> SheetResult<()> {
        self.require(SheetStage::Uninitialized)?;
        self.video.sample_at(
            timestamps,
            self.options.failure_policy,
            self.options.parallel_extraction,
        )?;
        self.stage = SheetStage::Sampled;
        Ok(())
    }

    pub fn shrink(&mut self) -> SheetResult<()> {
        self.require(SheetStage::Sampled)?;
        self.video.shrink_thumbnails(self.options.max_thumb_size);
        self.stage = SheetStage::Resized;
        Ok(())
    }

    pub fn build_grid(&mut self) -> SheetResult<()> {
        self.require(SheetStage::Resized)?;

        let labels = self.options.show_timestamp.then(|| TimestampLabels {
            painter: self.painter.as_ref(),
            colour: self.options.text(),
        });
        let grid = compose_grid(
            self.video.thumbnails(),
            GridLayout::new(self.options.columns, self.video.thumb_size()),
            self.video.pixel_mode(),
            self.options.background(),
            labels,
        )?;

        self.grid = Some(grid);
        self.stage = SheetStage::GridBuilt;
        Ok(())
    }

    pub fn build_header(&mut self) -> SheetResult<()> {
        self.require(SheetStage::GridBuilt)?;
        let width = self.grid.as_ref().map_or(0, DynamicImage::width);

        let header = compose_header(
            &self.video,
            width,
            self.options.header_height,
            self.video.pixel_mode(),
            self.options.background(),
            self.options.text(),
            self.painter.as_ref(),
        );

        self.header = Some(header);
        self.stage = SheetStage::HeaderBuilt;
        Ok(())
    }

    /// 標頭在上、網格緊接在下，拼成最終預覽圖
    pub fn assemble(&mut self) -> SheetResult<&DynamicImage> {
        self.require(SheetStage::HeaderBuilt)?;
        let (Some(header), Some(grid)) = (&self.header, &self.grid) else {
            return Err(SheetError::OrderingViolation {
                expected: SheetStage::HeaderBuilt,
                actual: self.stage,
            });
        };

        let width = grid.width();
        let Some(height) = header.height().checked_add(grid.height()) else {
            return Err(SheetError::CanvasTooLarge {
                columns: self.options.columns,
                rows: GridLayout::new(self.options.columns, self.video.thumb_size())
                    .rows(self.video.thumbnails().len()),
            });
        };
        let mut sheet = self
            .video
            .pixel_mode()
            .filled(width, height, self.options.background());
        paste(&mut sheet, header, 0, 0);
        paste(&mut sheet, grid, 0, i64::from(header.height()));

        debug!(
            "{}: 預覽圖 {width}x{height}，共 {} 張縮圖",
            self.video.path().display(),
            self.video.thumbnails().len()
        );

        self.stage = SheetStage::Assembled;
        Ok(&*self.sheet.insert(sheet))
    }

    fn run_steps(&mut self, timestamps: &[u64]) -> SheetResult<&DynamicImage> {
        self.reset();
        self.sample(timestamps)?;
        self.shrink()?;
        self.build_grid()?;
        self.build_header()?;
        self.assemble()
    }

    pub fn assemble_by_interval(&mut self, interval: u64) -> SheetResult<&DynamicImage> {
        if interval == 0 {
            return Err(SheetError::InvalidInterval);
        }
        let timestamps = interval_timestamps(self.video.duration_seconds(), interval);
        self.run_steps(&timestamps)
    }

    pub fn assemble_by_count(&mut self, count: usize) -> SheetResult<&DynamicImage> {
        let timestamps = count_timestamps(self.video.duration_seconds(), count)?;
        self.run_steps(&timestamps)
    }

    pub fn assemble_with(&mut self, mode: SamplingMode) -> SheetResult<&DynamicImage> {
        match mode {
            SamplingMode::ByInterval(interval) => self.assemble_by_interval(interval),
            SamplingMode::ByCount(count) => self.assemble_by_count(count),
        }
    }
}

/// 指定張數時的間隔：`duration / max(count - 1, 1)`（無條件捨去，至少 1 秒）
pub fn count_interval(duration: u64, count: usize) -> SheetResult<u64> {
    if count < 1 {
        return Err(SheetError::InvalidCount(count));
    }
    let gaps = u64::try_from(count - 1).unwrap_or(u64::MAX).max(1);
    Ok((duration / gaps).max(1))
}

/// 指定張數時的取樣時間點，含片頭（第 0 秒）
///
/// 影片太短時每秒最多一張，時間點不超過 `duration`。
pub fn count_timestamps(duration: u64, count: usize) -> SheetResult<Vec<u64>> {
    let interval = count_interval(duration, count)?;
    let timestamps: Vec<u64> = (0..count as u64)
        .map(|i| i.saturating_mul(interval))
        .take_while(|&timestamp| timestamp <= duration)
        .collect();

    if timestamps.len() < count {
        debug!(
            "影片長度 {duration}s 不足以取 {count} 張不同畫面，改取 {} 張",
            timestamps.len()
        );
    }
    Ok(timestamps)
}
