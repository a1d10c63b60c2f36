use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimestampSource {
    ImageExif,
    VideoContainer,
}

/// A creation instant normalized to UTC.
///
/// `explicit_offset` records whether the metadata carried an offset. When it
/// did not, the naive wall-clock value was labeled as UTC unchanged, so the
/// formatted name shows the camera's local time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreationTimestamp {
    pub instant: DateTime<Utc>,
    pub explicit_offset: bool,
    pub source: TimestampSource,
}

impl CreationTimestamp {
    pub fn from_naive(naive: NaiveDateTime, source: TimestampSource) -> Self {
        Self {
            instant: naive.and_utc(),
            explicit_offset: false,
            source,
        }
    }

    pub fn from_aware<Tz: chrono::TimeZone>(value: DateTime<Tz>, source: TimestampSource) -> Self {
        Self {
            instant: value.with_timezone(&Utc),
            explicit_offset: true,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreationTimestamp, TimestampSource};
    use chrono::{DateTime, NaiveDate};

    #[test]
    fn naive_values_are_labeled_utc_without_shifting() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .expect("valid date");
        let ts = CreationTimestamp::from_naive(naive, TimestampSource::ImageExif);
        assert_eq!(ts.instant.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(!ts.explicit_offset);
    }

    #[test]
    fn aware_values_are_converted_to_utc() {
        let aware = DateTime::parse_from_rfc3339("2023-06-15T10:00:00+02:00").expect("rfc3339");
        let ts = CreationTimestamp::from_aware(aware, TimestampSource::VideoContainer);
        assert_eq!(ts.instant.to_rfc3339(), "2023-06-15T08:00:00+00:00");
        assert!(ts.explicit_offset);
        assert_eq!(ts.source, TimestampSource::VideoContainer);
    }
}
