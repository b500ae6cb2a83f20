use crate::config::is_video_file;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 掃描資料夾內的影片檔案
///
/// `recursive` 為 false 時只看第一層。結果依路徑排序，讓輸出順序穩定。
pub fn scan_video_files(directory: &Path, recursive: bool) -> Result<Vec<VideoFileInfo>> {
    let walker = WalkDir::new(directory).follow_links(false);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut video_files = Vec::new();
    for entry in walker {
        let entry =
            entry.with_context(|| format!("無法讀取資料夾內容: {}", directory.display()))?;
        if !entry.file_type().is_file() || !is_video_file(entry.path()) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        video_files.push(VideoFileInfo {
            path: entry.into_path(),
            size,
        });
    }

    video_files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(video_files)
}
