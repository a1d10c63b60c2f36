use crate::avi_reader::{is_avi, read_avi_date_text};
use crate::timestamp::{CreationTimestamp, TimestampSource};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use nom_exif::{EntryValue, MediaParser, MediaSource, TrackInfo, TrackInfoTag};
use std::path::Path;
use tracing::debug;

const AWARE_PATTERNS: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z"];
const NAIVE_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y:%m:%d %H:%M:%S",
    // AVI IDIT, e.g. "Tue Jan 02 03:04:05 2024"
    "%a %b %d %H:%M:%S %Y",
];

/// Reads the container creation date of a video file.
///
/// Never fails: an unknown container, a parse error or an absent field all
/// come back as `None`. The source and parser are dropped before returning.
///
/// AVI has no track info in nom-exif, so RIFF files go through the chunk
/// walk in `avi_reader` instead.
pub fn read_video_timestamp(path: &Path) -> Option<CreationTimestamp> {
    if is_avi(path) {
        let timestamp = read_avi_date_text(path).and_then(|text| parse_text_date(&text));
        if timestamp.is_none() {
            debug!(path = %path.display(), "no usable IDIT/ICRD date in AVI");
        }
        return timestamp;
    }

    let source = match MediaSource::file_path(path) {
        Ok(source) => source,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "unsupported or unreadable container");
            return None;
        }
    };
    if !source.has_track() {
        debug!(path = %path.display(), "container carries no track info");
        return None;
    }

    let mut parser = MediaParser::new();
    let info: TrackInfo = match parser.parse(source) {
        Ok(info) => info,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "track info extraction failed");
            return None;
        }
    };

    let timestamp = info.get(TrackInfoTag::CreateDate).and_then(timestamp_from_entry);
    if timestamp.is_none() {
        debug!(path = %path.display(), "no creation date in container");
    }
    timestamp
}

fn timestamp_from_entry(value: &EntryValue) -> Option<CreationTimestamp> {
    match value {
        EntryValue::Time(time) => Some(CreationTimestamp::from_aware(
            *time,
            TimestampSource::VideoContainer,
        )),
        EntryValue::Text(text) => parse_text_date(text),
        other => parse_text_date(&other.to_string()),
    }
}

fn parse_text_date(input: &str) -> Option<CreationTimestamp> {
    let normalized = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(normalized) {
        return Some(CreationTimestamp::from_aware(
            dt,
            TimestampSource::VideoContainer,
        ));
    }
    for fmt in AWARE_PATTERNS {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(CreationTimestamp::from_aware(
                dt,
                TimestampSource::VideoContainer,
            ));
        }
    }
    for fmt in NAIVE_PATTERNS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            return Some(CreationTimestamp::from_naive(
                naive,
                TimestampSource::VideoContainer,
            ));
        }
    }
    // ICRD is often a bare date.
    NaiveDate::parse_from_str(normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| CreationTimestamp::from_naive(naive, TimestampSource::VideoContainer))
}

#[cfg(test)]
fn mp4_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let len = u32::try_from(body.len() + 8).expect("box fits");
    let mut out = len.to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// Builds an MP4 with `ftyp` and a `moov` holding a version 0 `mvhd` and one
/// `trak/tkhd`. `creation` counts seconds since 1904-01-01T00:00:00Z.
#[cfg(test)]
pub(crate) fn mp4_with_creation(creation: u32) -> Vec<u8> {
    const IDENTITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

    let mut ftyp = b"isom".to_vec();
    ftyp.extend_from_slice(&0x200u32.to_be_bytes());
    ftyp.extend_from_slice(b"isomiso2mp41");

    let mut mvhd = vec![0u8; 4];
    mvhd.extend_from_slice(&creation.to_be_bytes());
    mvhd.extend_from_slice(&creation.to_be_bytes());
    mvhd.extend_from_slice(&1000u32.to_be_bytes());
    mvhd.extend_from_slice(&2000u32.to_be_bytes());
    mvhd.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd.extend_from_slice(&0x0100u16.to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 10]);
    for value in IDENTITY_MATRIX {
        mvhd.extend_from_slice(&value.to_be_bytes());
    }
    mvhd.extend_from_slice(&[0u8; 24]);
    mvhd.extend_from_slice(&2u32.to_be_bytes());

    let mut tkhd = vec![0, 0, 0, 3];
    tkhd.extend_from_slice(&creation.to_be_bytes());
    tkhd.extend_from_slice(&creation.to_be_bytes());
    tkhd.extend_from_slice(&1u32.to_be_bytes());
    tkhd.extend_from_slice(&[0u8; 4]);
    tkhd.extend_from_slice(&2000u32.to_be_bytes());
    tkhd.extend_from_slice(&[0u8; 8]);
    tkhd.extend_from_slice(&[0u8; 8]);
    for value in IDENTITY_MATRIX {
        tkhd.extend_from_slice(&value.to_be_bytes());
    }
    tkhd.extend_from_slice(&(640u32 << 16).to_be_bytes());
    tkhd.extend_from_slice(&(480u32 << 16).to_be_bytes());

    let trak = mp4_box(b"trak", &mp4_box(b"tkhd", &tkhd));
    let mut moov_body = mp4_box(b"mvhd", &mvhd);
    moov_body.extend_from_slice(&trak);

    let mut file = mp4_box(b"ftyp", &ftyp);
    file.extend_from_slice(&mp4_box(b"moov", &moov_body));
    file.extend_from_slice(&mp4_box(b"mdat", &[0u8; 16]));
    file
}

/// 2024-01-02T03:04:05Z in `mvhd` time.
#[cfg(test)]
pub(crate) const MVHD_2024_01_02_030405: u32 = 3_787_009_445;
