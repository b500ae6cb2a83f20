use std::path::Path;

/// 批次模式會處理的影片副檔名
pub const VIDEO_EXTENSIONS: &[&str] = &[".mkv", ".mp4", ".avi", ".wmv", ".mpg", ".mov"];

/// 依副檔名判斷是否為影片檔（不分大小寫）
#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = format!(".{}", ext.to_lowercase());
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
}
