mod frame_extractor;
mod image_tools;
mod path_validator;
mod text_painter;
mod time_format;
mod video_scanner;

pub use frame_extractor::{Ffmpeg, FrameDecoder, parse_duration};
pub use image_tools::{PixelMode, fit_within, paste, save_image, shrink_to_fit};
pub use path_validator::{
    ensure_directory_exists, ensure_writable, plan_output_paths, resolve_output_path,
    validate_directory_exists,
};
pub use text_painter::{TextPainter, TrueTypePainter};
pub use time_format::format_timestamp;
pub use video_scanner::{VideoFileInfo, scan_video_files};
