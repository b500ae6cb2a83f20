/// 將秒數格式化為 `HH:MM:SS`
///
/// 每個欄位至少兩位數補零，小時不會在 24 或 99 處折返，
/// 例如 `3600 * 25` 秒為 `"25:00:00"`，`360_000` 秒為 `"100:00:00"`。
#[must_use]
pub fn format_timestamp(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
