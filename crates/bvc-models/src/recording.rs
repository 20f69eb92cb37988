//! Dashcam recording files.
//!
//! BlackVue units write one file per camera per minute, named after the
//! recording start time and a type code, e.g. `20240301_081502_NF.mp4`.
//! The first letter of the type code is the recording mode (`N`ormal,
//! `E`vent, `P`arking, `M`anual, `I`mpact) and the last letter the camera.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

/// Timestamp format embedded in recording and produced file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension of recordings that are fed to ffmpeg.
pub const VIDEO_EXTENSION: &str = "mp4";

static RECORDING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+_\d+)_([A-Z]+)\.(.+)").unwrap());

/// Errors raised while interpreting file names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("Invalid timestamp '{0}' in file name")]
    InvalidTimestamp(String),
}

/// Parse a `YYYYmmdd_HHMMSS` timestamp.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RecordingError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| RecordingError::InvalidTimestamp(value.to_string()))
}

/// Camera a recording belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Camera {
    Front,
    Rear,
}

impl Camera {
    /// Processing order of cameras within a session.
    pub const ALL: [Camera; 2] = [Camera::Front, Camera::Rear];

    /// Derive the camera from the last letter of a type code.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind.chars().last() {
            Some('F') => Some(Self::Front),
            Some('R') => Some(Self::Rear),
            _ => None,
        }
    }

    /// Single-letter code used in produced file names.
    pub fn code(self) -> char {
        match self {
            Self::Front => 'F',
            Self::Rear => 'R',
        }
    }

    /// Human readable label used in session titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Rear => "Rear",
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A recording file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Start time encoded in the file name
    pub recorded_at: NaiveDateTime,
    /// Type code, e.g. `NF`, `ER`, `IF`
    pub kind: String,
    /// Extension without the leading dot
    pub extension: String,
    /// Full path of the file
    pub path: PathBuf,
}

impl Recording {
    /// Interpret `file_name` as a recording stored in `dir`.
    ///
    /// Returns `Ok(None)` for names that are not recordings at all and an
    /// error when the name looks like a recording but carries an
    /// impossible timestamp.
    pub fn from_file_name(
        dir: impl AsRef<Path>,
        file_name: &str,
    ) -> Result<Option<Self>, RecordingError> {
        let Some(caps) = RECORDING_PATTERN.captures(file_name) else {
            return Ok(None);
        };

        Ok(Some(Self {
            recorded_at: parse_timestamp(&caps[1])?,
            kind: caps[2].to_string(),
            extension: caps[3].to_string(),
            path: dir.as_ref().join(file_name),
        }))
    }

    /// Whether the recording was triggered by an impact.
    pub fn is_impact(&self) -> bool {
        self.kind.starts_with('I')
    }

    /// Camera the recording belongs to, if the type code names one.
    pub fn camera(&self) -> Option<Camera> {
        Camera::from_kind(&self.kind)
    }

    /// Whether this is a video file (as opposed to GPS or sensor logs).
    pub fn is_video(&self) -> bool {
        self.extension == VIDEO_EXTENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parse_front_video() {
        let rec = Recording::from_file_name("/data/in", "20240301_081502_NF.mp4")
            .unwrap()
            .unwrap();

        assert_eq!(
            rec.recorded_at.date(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(rec.recorded_at.hour(), 8);
        assert_eq!(rec.recorded_at.second(), 2);
        assert_eq!(rec.kind, "NF");
        assert_eq!(rec.extension, "mp4");
        assert_eq!(rec.path, PathBuf::from("/data/in/20240301_081502_NF.mp4"));
        assert_eq!(rec.camera(), Some(Camera::Front));
        assert!(rec.is_video());
        assert!(!rec.is_impact());
    }

    #[test]
    fn test_parse_non_video_and_impact() {
        let gps = Recording::from_file_name("/d", "20240301_081502_N.gps")
            .unwrap()
            .unwrap();
        assert!(!gps.is_video());
        assert_eq!(gps.camera(), None);

        let impact = Recording::from_file_name("/d", "20240301_081502_IR.mp4")
            .unwrap()
            .unwrap();
        assert!(impact.is_impact());
        assert_eq!(impact.camera(), Some(Camera::Rear));
    }

    #[test]
    fn test_unrelated_names_are_ignored() {
        for name in [
            "README.txt",
            "20240301_081502-20240301_090000_F.mp4",
            "20240301_081502_nf.mp4",
            "x20240301_081502_NF.mp4",
        ] {
            assert_eq!(Recording::from_file_name("/d", name).unwrap(), None, "{name}");
        }
    }

    #[test]
    fn test_invalid_timestamp_is_an_error() {
        let err = Recording::from_file_name("/d", "20241301_081502_NF.mp4").unwrap_err();
        assert_eq!(err, RecordingError::InvalidTimestamp("20241301_081502".into()));
    }

    #[test]
    fn test_camera_codes() {
        assert_eq!(Camera::from_kind("EF"), Some(Camera::Front));
        assert_eq!(Camera::from_kind("PR"), Some(Camera::Rear));
        assert_eq!(Camera::from_kind("N"), None);
        assert_eq!(Camera::Front.to_string(), "F");
        assert_eq!(Camera::Rear.label(), "Rear");
    }
}
