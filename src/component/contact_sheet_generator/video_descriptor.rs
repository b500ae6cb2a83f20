use crate::config::FailurePolicy;
use crate::error::{SheetError, SheetResult};
use crate::tools::{FrameDecoder, PixelMode, shrink_to_fit};
use image::DynamicImage;
use log::{debug, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// 已擷取的縮圖與其實際擷取時間點（秒）
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub image: DynamicImage,
    pub timestamp: u64,
}

/// 影片檔資訊與擷取到的縮圖
///
/// 只能透過 [`VideoDescriptor::open`] 建立：第 0 秒的探測幀與影片長度
/// 都成功取得後才會回傳，解析度、像素格式與長度之後不再變動。
pub struct VideoDescriptor {
    path: PathBuf,
    file_size_mb: f64,
    resolution: (u32, u32),
    pixel_mode: PixelMode,
    duration_seconds: u64,
    thumbnails: Vec<Thumbnail>,
    thumb_size: (u32, u32),
    decoder: Arc<dyn FrameDecoder>,
}

impl std::fmt::Debug for VideoDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDescriptor")
            .field("path", &self.path)
            .field("file_size_mb", &self.file_size_mb)
            .field("resolution", &self.resolution)
            .field("pixel_mode", &self.pixel_mode)
            .field("duration_seconds", &self.duration_seconds)
            .field("thumbnails", &self.thumbnails.len())
            .field("thumb_size", &self.thumb_size)
            .finish_non_exhaustive()
    }
}

impl VideoDescriptor {
    pub fn open(path: impl AsRef<Path>, decoder: Arc<dyn FrameDecoder>) -> SheetResult<Self> {
        let path = path.as_ref().to_path_buf();

        let metadata = fs::metadata(&path).map_err(|e| SheetError::UnreadableVideo {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let probe = decoder.extract_frame(&path, 0).map_err(|e| {
            if e.is_frame_failure() {
                SheetError::UnreadableVideo {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            } else {
                e
            }
        })?;

        let duration_seconds = decoder.probe_duration(&path)?;
        let resolution = (probe.width(), probe.height());
        let pixel_mode = PixelMode::of(&probe);

        debug!(
            "開啟影片 {}: {}x{} {:?}, {}s",
            path.display(),
            resolution.0,
            resolution.1,
            pixel_mode,
            duration_seconds
        );

        Ok(Self {
            path,
            file_size_mb: metadata.len() as f64 / BYTES_PER_MB,
            resolution,
            pixel_mode,
            duration_seconds,
            thumbnails: Vec::new(),
            thumb_size: resolution,
            decoder,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().to_string())
    }

    #[must_use]
    pub const fn file_size_mb(&self) -> f64 {
        self.file_size_mb
    }

    #[must_use]
    pub const fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    #[must_use]
    pub const fn pixel_mode(&self) -> PixelMode {
        self.pixel_mode
    }

    #[must_use]
    pub const fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    #[must_use]
    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    /// 縮圖的工作尺寸；縮放前等於原始解析度
    #[must_use]
    pub const fn thumb_size(&self) -> (u32, u32) {
        self.thumb_size
    }

    pub fn clear_thumbnails(&mut self) {
        self.thumbnails.clear();
        self.thumb_size = self.resolution;
    }

    /// 以固定間隔擷取：`0, interval, 2·interval, … < duration`
    pub fn sample_thumbnails(
        &mut self,
        interval: u64,
        policy: FailurePolicy,
        parallel: bool,
    ) -> SheetResult<()> {
        if interval == 0 {
            return Err(SheetError::InvalidInterval);
        }
        let timestamps = interval_timestamps(self.duration_seconds, interval);
        self.sample_at(&timestamps, policy, parallel)
    }

    /// 依序擷取指定時間點的畫面
    ///
    /// 成功時以新結果取代舊縮圖；失敗時原有縮圖保持不變。
    /// 平行擷取時結果依索引收集，順序與 `timestamps` 相同。
    pub fn sample_at(
        &mut self,
        timestamps: &[u64],
        policy: FailurePolicy,
        parallel: bool,
    ) -> SheetResult<()> {
        let decoder = &self.decoder;
        let path = self.path.as_path();
        let extract = |&timestamp: &u64| (timestamp, decoder.extract_frame(path, timestamp));

        let thumbnails = if parallel {
            let results: Vec<_> = timestamps.par_iter().map(extract).collect();
            collect_thumbnails(results, policy)?
        } else {
            // 嚴格模式下遇到第一個失敗即停止，不再呼叫解碼器
            collect_thumbnails(timestamps.iter().map(extract), policy)?
        };

        debug!(
            "{}: 擷取 {}/{} 張縮圖",
            self.path.display(),
            thumbnails.len(),
            timestamps.len()
        );

        self.thumbnails = thumbnails;
        self.thumb_size = self.resolution;
        Ok(())
    }

    /// 將所有縮圖縮小到 `max_size` 以內，保持長寬比、不放大
    pub fn shrink_thumbnails(&mut self, max_size: (u32, u32)) {
        if self.thumbnails.is_empty() {
            return;
        }

        self.thumbnails
            .par_iter_mut()
            .for_each(|thumbnail| {
                shrink_to_fit(&mut thumbnail.image, max_size);
            });

        let first = &self.thumbnails[0].image;
        self.thumb_size = (first.width(), first.height());
    }
}

/// 固定間隔的取樣時間點，共 `ceil(duration / interval)` 個
#[must_use]
pub fn interval_timestamps(duration: u64, interval: u64) -> Vec<u64> {
    if interval == 0 {
        return Vec::new();
    }
    let step = usize::try_from(interval).unwrap_or(usize::MAX);
    (0..duration).step_by(step).collect()
}

fn collect_thumbnails(
    results: impl IntoIterator<Item = (u64, SheetResult<DynamicImage>)>,
    policy: FailurePolicy,
) -> SheetResult<Vec<Thumbnail>> {
    let mut thumbnails = Vec::new();

    for (timestamp, result) in results {
        match result {
            Ok(image) => thumbnails.push(Thumbnail { image, timestamp }),
            Err(e) if e.is_frame_failure() && policy == FailurePolicy::Lenient => {
                warn!("略過 {timestamp}s 的畫面: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(thumbnails)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::contact_sheet_generator::test_support::{
        SyntheticDecoder, fake_video_file,
    };

    fn open_video(decoder: SyntheticDecoder) -> (tempfile::TempDir, VideoDescriptor, Arc<SyntheticDecoder>) {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_video_file(dir.path(), "clip.mp4", 2 * 1_048_576);
        let decoder = Arc::new(decoder);
        let video = VideoDescriptor::open(&path, Arc::clone(&decoder) as Arc<dyn FrameDecoder>).unwrap();
        (dir, video, decoder)
    }

    #[test]
    fn test_open_reads_metadata() {
        let (_dir, video, _) = open_video(SyntheticDecoder::new(640, 360, 95));
        assert_eq!(video.resolution(), (640, 360));
        assert_eq!(video.pixel_mode(), PixelMode::Rgb8);
        assert_eq!(video.duration_seconds(), 95);
        assert!((video.file_size_mb() - 2.0).abs() < 1e-9);
        assert_eq!(video.file_name(), "clip.mp4");
        assert!(video.thumbnails().is_empty());
        assert_eq!(video.thumb_size(), (640, 360));
    }

    #[test]
    fn test_open_keeps_probe_pixel_mode() {
        let decoder = SyntheticDecoder::new(64, 64, 10).with_mode(PixelMode::Rgba16);
        let (_dir, video, _) = open_video(decoder);
        assert_eq!(video.pixel_mode(), PixelMode::Rgba16);
    }

    #[test]
    fn test_open_fails_when_probe_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_video_file(dir.path(), "broken.mp4", 16);
        let decoder = Arc::new(SyntheticDecoder::new(64, 64, 10).failing_at(&[0]));
        let result = VideoDescriptor::open(&path, decoder);
        assert!(matches!(result, Err(SheetError::UnreadableVideo { .. })));
    }

    #[test]
    fn test_open_fails_without_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = fake_video_file(dir.path(), "clip.mp4", 16);
        let decoder = Arc::new(SyntheticDecoder::new(64, 64, 10).without_duration());
        let result = VideoDescriptor::open(&path, decoder);
        assert!(matches!(result, Err(SheetError::UnparsableDuration { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        let decoder = Arc::new(SyntheticDecoder::new(64, 64, 10));
        let result = VideoDescriptor::open("/nonexistent/clip.mp4", decoder);
        assert!(matches!(result, Err(SheetError::UnreadableVideo { .. })));
    }

    #[test]
    fn test_interval_timestamps() {
        assert_eq!(interval_timestamps(95, 20), vec![0, 20, 40, 60, 80]);
        assert_eq!(interval_timestamps(100, 20), vec![0, 20, 40, 60, 80]);
        assert_eq!(interval_timestamps(101, 20).len(), 6);
        assert_eq!(interval_timestamps(0, 20), Vec::<u64>::new());
        assert_eq!(interval_timestamps(10, 0), Vec::<u64>::new());
    }

    #[test]
    fn test_interval_count_is_ceiling() {
        for duration in [1u64, 7, 59, 60, 61, 95, 3600] {
            for interval in [1u64, 2, 7, 20, 60] {
                let expected = duration.div_ceil(interval) as usize;
                assert_eq!(interval_timestamps(duration, interval).len(), expected);
            }
        }
    }

    #[test]
    fn test_sample_thumbnails_by_interval() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(640, 360, 95));
        video
            .sample_thumbnails(20, FailurePolicy::Strict, false)
            .unwrap();
        let timestamps: Vec<_> = video.thumbnails().iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![0, 20, 40, 60, 80]);
    }

    #[test]
    fn test_sample_rejects_zero_interval() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(64, 64, 95));
        let result = video.sample_thumbnails(0, FailurePolicy::Lenient, false);
        assert!(matches!(result, Err(SheetError::InvalidInterval)));
    }

    #[test]
    fn test_strict_policy_aborts_on_failed_frame() {
        let (_dir, mut video, decoder) =
            open_video(SyntheticDecoder::new(64, 64, 95).failing_at(&[40]));

        let result = video.sample_thumbnails(20, FailurePolicy::Strict, false);

        assert!(matches!(
            result,
            Err(SheetError::InvalidFrame { timestamp: 40, .. })
        ));
        assert!(video.thumbnails().is_empty());
        // 探測幀 0 加上 0、20、40，之後不再呼叫
        assert_eq!(decoder.calls(), vec![0, 0, 20, 40]);
    }

    #[test]
    fn test_strict_policy_parallel_reports_first_failure() {
        let (_dir, mut video, _) =
            open_video(SyntheticDecoder::new(64, 64, 95).failing_at(&[60, 20]));
        let result = video.sample_thumbnails(20, FailurePolicy::Strict, true);
        assert!(matches!(
            result,
            Err(SheetError::InvalidFrame { timestamp: 20, .. })
        ));
        assert!(video.thumbnails().is_empty());
    }

    #[test]
    fn test_lenient_policy_skips_failed_frames() {
        let (_dir, mut video, _) =
            open_video(SyntheticDecoder::new(64, 64, 95).failing_at(&[20, 60]));

        video
            .sample_thumbnails(20, FailurePolicy::Lenient, true)
            .unwrap();

        let timestamps: Vec<_> = video.thumbnails().iter().map(|t| t.timestamp).collect();
        assert_eq!(timestamps, vec![0, 40, 80]);
        // 每張縮圖的內容對應其擷取時間點
        for thumbnail in video.thumbnails() {
            let red = thumbnail.image.to_rgb8().get_pixel(0, 0).0[0];
            assert_eq!(u64::from(red), thumbnail.timestamp);
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(32, 32, 300));
        video.sample_thumbnails(7, FailurePolicy::Strict, true).unwrap();
        let parallel: Vec<_> = video.thumbnails().iter().map(|t| t.timestamp).collect();
        video.sample_thumbnails(7, FailurePolicy::Strict, false).unwrap();
        let sequential: Vec<_> = video.thumbnails().iter().map(|t| t.timestamp).collect();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 43);
    }

    #[test]
    fn test_frame_beyond_duration_is_invalid_frame() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(64, 64, 95));
        let result = video.sample_at(&[0, 500], FailurePolicy::Strict, false);
        assert!(matches!(
            result,
            Err(SheetError::InvalidFrame { timestamp: 500, .. })
        ));
    }

    #[test]
    fn test_shrink_thumbnails() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(1920, 1080, 60));
        video
            .sample_thumbnails(20, FailurePolicy::Strict, false)
            .unwrap();

        video.shrink_thumbnails((220, 220));

        assert_eq!(video.thumb_size(), (220, 124));
        assert!(
            video
                .thumbnails()
                .iter()
                .all(|t| (t.image.width(), t.image.height()) == (220, 124))
        );
        // 原始資訊不受影響
        assert_eq!(video.resolution(), (1920, 1080));
    }

    #[test]
    fn test_shrink_thumbnails_idempotent() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(800, 600, 60));
        video
            .sample_thumbnails(30, FailurePolicy::Strict, false)
            .unwrap();
        video.shrink_thumbnails((220, 220));
        let first = video.thumb_size();
        video.shrink_thumbnails((220, 220));
        assert_eq!(video.thumb_size(), first);
        assert_eq!(first, (220, 165));
    }

    #[test]
    fn test_shrink_without_thumbnails_is_noop() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(800, 600, 60));
        video.shrink_thumbnails((220, 220));
        assert_eq!(video.thumb_size(), (800, 600));
    }

    #[test]
    fn test_small_video_not_upscaled() {
        let (_dir, mut video, _) = open_video(SyntheticDecoder::new(160, 90, 60));
        video
            .sample_thumbnails(30, FailurePolicy::Strict, false)
            .unwrap();
        video.shrink_thumbnails((220, 220));
        assert_eq!(video.thumb_size(), (160, 90));
    }
}
