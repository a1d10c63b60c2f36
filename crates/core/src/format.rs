use crate::error::FormatError;
use crate::timestamp::CreationTimestamp;
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write;
use std::path::Path;

pub const DEFAULT_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn validate_format(format: &str) -> Result<(), FormatError> {
    if format.is_empty() {
        return Err(FormatError::Empty);
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(FormatError::InvalidSpecifier(format.to_string()));
    }
    Ok(())
}

/// Renders `timestamp` (in UTC) with `format` and appends `extension_with_dot`
/// verbatim.
pub fn render_file_name(
    timestamp: &CreationTimestamp,
    format: &str,
    extension_with_dot: &str,
) -> Result<String, FormatError> {
    validate_format(format)?;

    let mut base = String::new();
    write!(base, "{}", timestamp.instant.format(format))
        .map_err(|_| FormatError::InvalidSpecifier(format.to_string()))?;

    Ok(format!("{}{}", sanitize_base(&base), extension_with_dot))
}

/// The suffix of `path` including its leading dot, in its original case.
pub fn extension_with_dot(path: &Path) -> String {
    path.extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default()
}

// Formatted names must stay inside the source directory.
fn sanitize_base(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if matches!(ch, '/' | '\\') || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect()
}
