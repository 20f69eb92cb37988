//! Names of files produced from a session.
//!
//! Every concatenation is identified by its span: the first and last
//! recording timestamps of the session plus the camera code, e.g.
//! `20240301_081502-20240301_090214_F`. The concat list and the output
//! video share that stem and differ only in extension.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::recording::{parse_timestamp, Camera, RecordingError, TIMESTAMP_FORMAT};

/// Extension of ffmpeg concat demuxer lists in the work directory.
pub const CONCAT_LIST_EXTENSION: &str = "con";

/// Extension of concatenated videos in the output directory.
pub const OUTPUT_EXTENSION: &str = "mp4";

static PRODUCED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+_\d+)-(\d+_\d+)_([A-Z]+)\.(.+)").unwrap());

/// Identifies one camera's concatenation of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanName {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub camera: Camera,
}

impl SpanName {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, camera: Camera) -> Self {
        Self { start, end, camera }
    }

    /// File name of the concat list.
    pub fn concat_list_file_name(&self) -> String {
        format!("{}.{}", self, CONCAT_LIST_EXTENSION)
    }

    /// File name of the concatenated video.
    pub fn output_file_name(&self) -> String {
        format!("{}.{}", self, OUTPUT_EXTENSION)
    }
}

impl fmt::Display for SpanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}_{}",
            self.start.format(TIMESTAMP_FORMAT),
            self.end.format(TIMESTAMP_FORMAT),
            self.camera
        )
    }
}

/// Date a produced file (concat list or output) was started on.
///
/// Returns `Ok(None)` when the name is not one this tool produces.
pub fn produced_file_date(file_name: &str) -> Result<Option<NaiveDate>, RecordingError> {
    match PRODUCED_PATTERN.captures(file_name) {
        Some(caps) => Ok(Some(parse_timestamp(&caps[1])?.date())),
        None => Ok(None),
    }
}

/// Title of a session used in log lines.
///
/// The end is shown as a bare time when the session does not cross
/// midnight.
pub fn session_title(start: NaiveDateTime, end: NaiveDateTime) -> String {
    if start.date() == end.date() {
        format!(
            "{} - {}",
            start.format("%Y/%m/%d %H:%M:%S"),
            end.format("%H:%M:%S")
        )
    } else {
        format!(
            "{} - {}",
            start.format("%Y/%m/%d %H:%M:%S"),
            end.format("%Y/%m/%d %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(value: &str) -> NaiveDateTime {
        parse_timestamp(value).unwrap()
    }

    #[test]
    fn test_span_file_names() {
        let span = SpanName::new(ts("20240301_081502"), ts("20240301_090214"), Camera::Rear);

        assert_eq!(span.to_string(), "20240301_081502-20240301_090214_R");
        assert_eq!(
            span.concat_list_file_name(),
            "20240301_081502-20240301_090214_R.con"
        );
        assert_eq!(
            span.output_file_name(),
            "20240301_081502-20240301_090214_R.mp4"
        );
    }

    #[test]
    fn test_produced_file_date() {
        assert_eq!(
            produced_file_date("20240301_235900-20240302_001500_F.mp4").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(produced_file_date("20240301_081502_NF.mp4").unwrap(), None);
        assert_eq!(produced_file_date("blackvueconcat.lock").unwrap(), None);
        assert!(produced_file_date("20240399_000000-20240301_000000_F.con").is_err());
    }

    #[test]
    fn test_session_title() {
        assert_eq!(
            session_title(ts("20240301_081502"), ts("20240301_090214")),
            "2024/03/01 08:15:02 - 09:02:14"
        );
        assert_eq!(
            session_title(ts("20240301_235502"), ts("20240302_000214")),
            "2024/03/01 23:55:02 - 2024/03/02 00:02:14"
        );
    }
}
