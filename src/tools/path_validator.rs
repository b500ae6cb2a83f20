use crate::config::OutputFormat;
use crate::error::SheetError;
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// 決定預覽圖輸出路徑
///
/// - 有指定輸出資料夾：`<資料夾>/<檔名>.<副檔名>`
/// - 未指定：與影片同資料夾、同檔名，只替換副檔名
#[must_use]
pub fn resolve_output_path(
    video_path: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> PathBuf {
    let file_stem = video_path
        .file_stem()
        .map_or_else(|| "contact_sheet".into(), |s| s.to_os_string());
    let mut file_name = file_stem;
    file_name.push(".");
    file_name.push(format.extension());

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => video_path.with_file_name(file_name),
    }
}

/// 決定批次模式中每部影片的預覽圖路徑
///
/// 有指定輸出資料夾時保留影片相對於 `input_dir` 的子資料夾。
/// 同一位置仍有多部影片對應到同一個檔名時（`trailer.mp4` 與 `trailer.mkv`），
/// 這幾部影片都改用 `<影片檔名>.<副檔名>`，例如 `trailer.mkv.png`。
#[must_use]
pub fn plan_output_paths(
    videos: &[&Path],
    input_dir: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Vec<PathBuf> {
    let targets: Vec<PathBuf> = videos
        .iter()
        .map(|video| {
            let target_dir = output_dir.map(|dir| {
                let relative_dir = video
                    .strip_prefix(input_dir)
                    .ok()
                    .and_then(Path::parent)
                    .unwrap_or_else(|| Path::new(""));
                dir.join(relative_dir)
            });
            resolve_output_path(video, target_dir.as_deref(), format)
        })
        .collect();

    let mut claims: HashMap<&Path, usize> = HashMap::new();
    for target in &targets {
        *claims.entry(target.as_path()).or_default() += 1;
    }

    videos
        .iter()
        .zip(&targets)
        .map(|(video, target)| {
            if claims.get(target.as_path()).copied().unwrap_or(0) < 2 {
                return target.clone();
            }
            let mut file_name: OsString = video
                .file_name()
                .map_or_else(|| "contact_sheet".into(), |name| name.to_os_string());
            file_name.push(".");
            file_name.push(format.extension());
            target.with_file_name(file_name)
        })
        .collect()
}

/// 輸出檔已存在且未允許覆寫時拒絕
pub fn ensure_writable(output_path: &Path, overwrite: bool) -> Result<(), SheetError> {
    if output_path.exists() && !overwrite {
        return Err(SheetError::OutputExists(output_path.to_path_buf()));
    }
    Ok(())
}
