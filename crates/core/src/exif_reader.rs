use crate::error::ExtractError;
use crate::timestamp::{CreationTimestamp, TimestampSource};
use chrono::{DateTime, NaiveDateTime};
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

const EXIF_DATE_PATTERN: &str = "%Y:%m:%d %H:%M:%S";
const EXIF_DATE_OFFSET_PATTERN: &str = "%Y:%m:%d %H:%M:%S%z";

/// Reads `DateTimeOriginal` (and `OffsetTimeOriginal` when present) from an
/// image's EXIF block.
///
/// A file without EXIF, or without the tag, yields `Ok(None)`. A tag whose
/// value does not parse is an error.
pub fn read_image_timestamp(path: &Path) -> Result<Option<CreationTimestamp>, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no readable EXIF block");
            return Ok(None);
        }
    };

    let Some(raw_date) = field_text(&exif, Tag::DateTimeOriginal) else {
        return Ok(None);
    };
    let raw_offset = field_text(&exif, Tag::OffsetTimeOriginal).filter(|o| !o.is_empty());

    parse_exif_datetime(&raw_date, raw_offset.as_deref())
        .map(Some)
        .map_err(|source| ExtractError::MalformedTimestamp {
            path: path.to_path_buf(),
            value: raw_date,
            offset: raw_offset,
            source,
        })
}

pub fn parse_exif_datetime(
    raw_date: &str,
    raw_offset: Option<&str>,
) -> Result<CreationTimestamp, chrono::ParseError> {
    match raw_offset.filter(|o| !o.is_empty()) {
        Some(offset) => {
            let combined = format!("{}{}", raw_date, offset.replace(':', ""));
            let parsed = DateTime::parse_from_str(&combined, EXIF_DATE_OFFSET_PATTERN)?;
            Ok(CreationTimestamp::from_aware(
                parsed,
                TimestampSource::ImageExif,
            ))
        }
        None => {
            let naive = NaiveDateTime::parse_from_str(raw_date, EXIF_DATE_PATTERN)?;
            Ok(CreationTimestamp::from_naive(
                naive,
                TimestampSource::ImageExif,
            ))
        }
    }
}

fn field_text(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let text = match field.value {
        Value::Ascii(ref parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default(),
        _ => field.display_value().to_string(),
    };
    Some(text.trim_end_matches('\0').trim().to_string())
}

/// Builds a minimal JPEG whose only segment is an EXIF APP1 block.
#[cfg(test)]
pub(crate) fn jpeg_with_exif(date: Option<&str>, offset: Option<&str>) -> Vec<u8> {
    use exif::experimental::Writer;
    use exif::Field;
    use std::io::Cursor;

    let ascii = |tag: Tag, text: &str| Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    };
    let make = ascii(Tag::Make, "FUJIFILM");
    let date = date.map(|d| ascii(Tag::DateTimeOriginal, d));
    let offset = offset.map(|o| ascii(Tag::OffsetTimeOriginal, o));

    let mut writer = Writer::new();
    writer.push_field(&make);
    if let Some(field) = date.as_ref() {
        writer.push_field(field);
    }
    if let Some(field) = offset.as_ref() {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("tiff must be writable");
    let tiff = tiff.into_inner();

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let segment_len = u16::try_from(tiff.len() + 8).expect("exif segment fits");
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

#[cfg(test)]
mod tests {
    use super::{jpeg_with_exif, parse_exif_datetime, read_image_timestamp};
    use crate::error::ExtractError;
    use crate::timestamp::TimestampSource;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_naive_value_as_utc() {
        let ts = parse_exif_datetime("2024:01:02 03:04:05", None).expect("must parse");
        assert_eq!(ts.instant.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(!ts.explicit_offset);
        assert_eq!(ts.source, TimestampSource::ImageExif);
    }

    #[test]
    fn applies_offset_before_converting_to_utc() {
        let ts = parse_exif_datetime("2023:06:15 10:00:00", Some("+02:00")).expect("must parse");
        assert_eq!(ts.instant.to_rfc3339(), "2023-06-15T08:00:00+00:00");
        assert!(ts.explicit_offset);

        let ts = parse_exif_datetime("2023:06:15 10:00:00", Some("-0530")).expect("must parse");
        assert_eq!(ts.instant.to_rfc3339(), "2023-06-15T15:30:00+00:00");
    }

    #[test]
    fn rejects_iso_style_dates() {
        assert!(parse_exif_datetime("2024-01-02 03:04:05", None).is_err());
        assert!(parse_exif_datetime("", None).is_err());
        assert!(parse_exif_datetime("2024:01:02 03:04:05", Some("bogus")).is_err());
    }

    #[test]
    fn reads_timestamp_from_jpeg() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("photo.JPG");
        fs::write(&path, jpeg_with_exif(Some("2024:01:02 03:04:05"), None)).expect("write jpeg");

        let ts = read_image_timestamp(&path)
            .expect("must read")
            .expect("timestamp present");
        assert_eq!(ts.instant.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn reads_offset_tag_from_jpeg() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("photo.jpg");
        fs::write(
            &path,
            jpeg_with_exif(Some("2023:06:15 10:00:00"), Some("+02:00")),
        )
        .expect("write jpeg");

        let ts = read_image_timestamp(&path)
            .expect("must read")
            .expect("timestamp present");
        assert_eq!(ts.instant.to_rfc3339(), "2023-06-15T08:00:00+00:00");
        assert!(ts.explicit_offset);
    }

    #[test]
    fn missing_tag_is_not_an_error() {
        let temp = tempdir().expect("tempdir");
        let tagless = temp.path().join("tagless.jpg");
        fs::write(&tagless, jpeg_with_exif(None, None)).expect("write jpeg");
        let empty = temp.path().join("empty.jpg");
        fs::write(&empty, b"").expect("write empty");
        let bare = temp.path().join("bare.jpg");
        fs::write(&bare, [0xFF, 0xD8, 0xFF, 0xD9]).expect("write bare jpeg");

        assert!(read_image_timestamp(&tagless).expect("tagless").is_none());
        assert!(read_image_timestamp(&empty).expect("empty").is_none());
        assert!(read_image_timestamp(&bare).expect("bare").is_none());
    }

    #[test]
    fn malformed_tag_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("broken.jpg");
        fs::write(&path, jpeg_with_exif(Some("not a date"), None)).expect("write jpeg");

        let err = read_image_timestamp(&path).expect_err("must fail");
        assert!(matches!(err, ExtractError::MalformedTimestamp { ref value, .. } if value == "not a date"));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn malformed_offset_is_named_in_the_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("shifted.jpg");
        fs::write(
            &path,
            jpeg_with_exif(Some("2024:01:02 03:04:05"), Some("+25:xx")),
        )
        .expect("write jpeg");

        let err = read_image_timestamp(&path).expect_err("must fail");
        match &err {
            ExtractError::MalformedTimestamp { value, offset, .. } => {
                assert_eq!(value, "2024:01:02 03:04:05");
                assert_eq!(offset.as_deref(), Some("+25:xx"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("offset \"+25:xx\""));
    }

    #[test]
    fn unopenable_file_is_an_io_error() {
        let temp = tempdir().expect("tempdir");
        let err = read_image_timestamp(&temp.path().join("missing.jpg")).expect_err("must fail");
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
