use serde::{Deserialize, Serialize};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

pub fn classify(path: &Path) -> MediaKind {
    let Some(ext) = path.extension().and_then(|v| v.to_str()) else {
        return MediaKind::Unsupported;
    };

    if IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        MediaKind::Video
    } else {
        MediaKind::Unsupported
    }
}
