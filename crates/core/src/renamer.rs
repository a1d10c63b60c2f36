use crate::config::MalformedPolicy;
use crate::error::ExtractError;
use crate::exif_reader::read_image_timestamp;
use crate::format::{validate_format, DEFAULT_FORMAT};
use crate::kind::MediaKind;
use crate::planner::{collect_media_files, plan_rename, MediaFile};
use crate::timestamp::CreationTimestamp;
use crate::video_reader::read_video_timestamp;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub dir: PathBuf,
    pub format: String,
    pub on_malformed: MalformedPolicy,
    pub dry_run: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: DEFAULT_FORMAT.to_string(),
            on_malformed: MalformedPolicy::default(),
            dry_run: false,
        }
    }
}

/// One reportable outcome. Unsupported files and files without a timestamp
/// produce no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameEvent {
    Renamed { from: PathBuf, to: PathBuf },
    WouldRename { from: PathBuf, to: PathBuf },
    Collision { from: PathBuf, target: PathBuf },
    Failed { path: PathBuf, reason: String },
}

impl fmt::Display for RenameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameEvent::Renamed { from, to } => {
                write!(f, "{} renamed to {}", name_of(from), name_of(to))
            }
            RenameEvent::WouldRename { from, to } => {
                write!(f, "{} would be renamed to {}", name_of(from), name_of(to))
            }
            RenameEvent::Collision { target, .. } => {
                write!(f, "file named {} already exists, skipping", name_of(target))
            }
            RenameEvent::Failed { path, reason } => {
                write!(f, "could not read {}: {}, skipping", name_of(path), reason)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RenameSummary {
    pub scanned: usize,
    pub unsupported: usize,
    pub no_timestamp: usize,
    pub renamed: usize,
    pub collisions: usize,
    pub failed: usize,
}

/// Renames every supported file directly inside `options.dir` after its
/// creation timestamp, reporting each outcome to `on_event` as it happens.
///
/// Files are visited in file-name order. Under [`MalformedPolicy::Abort`] the
/// first extraction error ends the run; renames already performed stay.
pub fn rename_directory<F>(options: &RenameOptions, mut on_event: F) -> Result<RenameSummary>
where
    F: FnMut(&RenameEvent),
{
    validate_format(&options.format)?;

    let files = collect_media_files(&options.dir)?;
    let mut summary = RenameSummary::default();
    let mut claimed_targets = HashSet::<PathBuf>::new();

    for file in files {
        summary.scanned += 1;

        let timestamp = match extract_timestamp(&file) {
            Extraction::Unsupported => {
                summary.unsupported += 1;
                continue;
            }
            Extraction::Missing => {
                debug!(path = %file.path.display(), "no creation timestamp, skipping");
                summary.no_timestamp += 1;
                continue;
            }
            Extraction::Failed(err) => match options.on_malformed {
                MalformedPolicy::Abort => {
                    return Err(anyhow::Error::new(err).context("stopping before remaining files"));
                }
                MalformedPolicy::Skip => {
                    info!(path = %err.path().display(), error = %err, "extraction failed, skipping");
                    summary.failed += 1;
                    on_event(&RenameEvent::Failed {
                        path: file.path.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            },
            Extraction::Found(ts) => ts,
        };

        let plan = plan_rename(&file.path, timestamp, &options.format)?;

        if plan.target_path.exists() || claimed_targets.contains(&plan.target_path) {
            info!(
                from = %plan.original_path.display(),
                target = %plan.target_path.display(),
                "target exists, skipping"
            );
            summary.collisions += 1;
            on_event(&RenameEvent::Collision {
                from: plan.original_path,
                target: plan.target_path,
            });
            continue;
        }
        claimed_targets.insert(plan.target_path.clone());

        if options.dry_run {
            on_event(&RenameEvent::WouldRename {
                from: plan.original_path,
                to: plan.target_path,
            });
            continue;
        }

        fs::rename(&plan.original_path, &plan.target_path).with_context(|| {
            format!(
                "failed to rename {} -> {}",
                plan.original_path.display(),
                plan.target_path.display()
            )
        })?;
        info!(
            from = %plan.original_path.display(),
            to = %plan.target_path.display(),
            explicit_offset = plan.timestamp.explicit_offset,
            "renamed"
        );
        summary.renamed += 1;
        on_event(&RenameEvent::Renamed {
            from: plan.original_path,
            to: plan.target_path,
        });
    }

    Ok(summary)
}

enum Extraction {
    Unsupported,
    Missing,
    Failed(ExtractError),
    Found(CreationTimestamp),
}

fn extract_timestamp(file: &MediaFile) -> Extraction {
    let result = match file.kind {
        MediaKind::Unsupported => return Extraction::Unsupported,
        MediaKind::Image => read_image_timestamp(&file.path),
        MediaKind::Video => Ok(read_video_timestamp(&file.path)),
    };

    match result {
        Ok(Some(ts)) => Extraction::Found(ts),
        Ok(None) => Extraction::Missing,
        Err(err) => Extraction::Failed(err),
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
