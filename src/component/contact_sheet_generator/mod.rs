//! 影片預覽圖生成元件
//!
//! 流程：
//! A. 探測第 0 秒畫面與影片長度
//! B. 依間隔或張數擷取縮圖
//! C. 縮小縮圖
//! D. 排成網格並標上時間
//! E. 繪製影片資訊標頭，與網格上下拼接

mod grid_compositor;
mod header_renderer;
mod main;
mod sheet_assembler;
#[cfg(test)]
mod test_support;
mod video_descriptor;

pub use grid_compositor::{GridLayout, TimestampLabels, compose_grid};
pub use header_renderer::{compose_header, header_lines};
pub use main::{ContactSheetGenerator, GenerationResult};
pub use sheet_assembler::{SheetAssembler, SheetStage, count_interval, count_timestamps};
pub use video_descriptor::{Thumbnail, VideoDescriptor, interval_timestamps};
