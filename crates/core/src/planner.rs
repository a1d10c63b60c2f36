use crate::error::FormatError;
use crate::format::{extension_with_dot, render_file_name};
use crate::kind::{classify, MediaKind};
use crate::timestamp::CreationTimestamp;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub timestamp: CreationTimestamp,
}

impl RenamePlan {
    pub fn original_name(&self) -> String {
        file_name_of(&self.original_path)
    }

    pub fn target_name(&self) -> String {
        file_name_of(&self.target_path)
    }
}

/// Lists the regular files directly inside `dir`, sorted by file name.
pub fn collect_media_files(dir: &Path) -> Result<Vec<MediaFile>> {
    let mut out = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list directory: {}", dir.display()))?;
        // Follows symlinks, so a link to a regular file counts as one.
        if !entry.path().is_file() {
            continue;
        }
        let path = entry.into_path();
        let kind = classify(&path);
        out.push(MediaFile { path, kind });
    }

    Ok(out)
}

/// Computes the target next to `file` for `timestamp` rendered with `format`.
pub fn plan_rename(
    file: &Path,
    timestamp: CreationTimestamp,
    format: &str,
) -> Result<RenamePlan, FormatError> {
    let name = render_file_name(&timestamp, format, &extension_with_dot(file))?;
    let parent = file.parent().unwrap_or_else(|| Path::new("."));

    Ok(RenamePlan {
        original_path: file.to_path_buf(),
        target_path: parent.join(name),
        timestamp,
    })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
