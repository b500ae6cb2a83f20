pub mod file_type;
pub mod load;
pub mod save;
pub mod types;

pub use file_type::{VIDEO_EXTENSIONS, is_video_file};
pub use types::{
    Config, DEFAULT_THUMBNAIL_COUNT, DecoderSettings, FailurePolicy, FontSpec, MAX_RECENT_PATHS,
    MIN_HEADER_HEIGHT, OutputFormat, SamplingMode, SheetOptions, UserSettings,
};
