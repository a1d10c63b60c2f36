mod avi_reader;
mod config;
mod error;
mod exif_reader;
mod format;
mod kind;
mod planner;
mod renamer;
mod timestamp;
mod video_reader;

pub use config::{app_paths, load_config_from, AppConfig, AppPaths, MalformedPolicy};
pub use error::{ExtractError, FormatError};
pub use exif_reader::{parse_exif_datetime, read_image_timestamp};
pub use format::{extension_with_dot, render_file_name, validate_format, DEFAULT_FORMAT};
pub use kind::{classify, MediaKind};
pub use planner::{collect_media_files, plan_rename, MediaFile, RenamePlan};
pub use renamer::{rename_directory, RenameEvent, RenameOptions, RenameSummary};
pub use timestamp::{CreationTimestamp, TimestampSource};
pub use video_reader::read_video_timestamp;
