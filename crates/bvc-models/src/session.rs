//! Grouping recordings into driving sessions.

use chrono::NaiveDateTime;

use crate::naming::{session_title, SpanName};
use crate::recording::{Camera, Recording};

/// Default maximum gap in seconds between two recordings of one session.
pub const DEFAULT_CONSECUTIVE_THRESHOLD_SECS: i64 = 64;

/// Options controlling how recordings are split into sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Recordings whose start times differ by at most this many seconds
    /// belong to the same session
    pub consecutive_threshold_secs: i64,
    /// Keep a leading run of impact recordings attached to the session
    /// that follows it
    pub initial_impact: bool,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            consecutive_threshold_secs: DEFAULT_CONSECUTIVE_THRESHOLD_SECS,
            initial_impact: false,
        }
    }
}

/// A run of recordings close enough in time to form one drive.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    recordings: Vec<Recording>,
}

impl Session {
    fn open(first: Recording) -> Self {
        Self {
            recordings: vec![first],
        }
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    fn last(&self) -> &Recording {
        &self.recordings[self.recordings.len() - 1]
    }

    /// Start time of the first recording.
    pub fn started_at(&self) -> NaiveDateTime {
        self.recordings[0].recorded_at
    }

    /// Start time of the last recording.
    pub fn ended_at(&self) -> NaiveDateTime {
        self.last().recorded_at
    }

    /// Whether every recording so far was triggered by an impact.
    pub fn is_impact_only(&self) -> bool {
        self.recordings.iter().all(Recording::is_impact)
    }

    /// Video recordings of one camera, in recording order.
    pub fn videos(&self, camera: Camera) -> Vec<&Recording> {
        self.recordings
            .iter()
            .filter(|r| r.is_video() && r.camera() == Some(camera))
            .collect()
    }

    /// Span name of this session's concatenation for `camera`.
    pub fn span(&self, camera: Camera) -> SpanName {
        SpanName::new(self.started_at(), self.ended_at(), camera)
    }

    /// Log title, e.g. `2024/03/01 08:15:02 - 09:02:14 Front`.
    pub fn title(&self, camera: Camera) -> String {
        format!(
            "{} {}",
            session_title(self.started_at(), self.ended_at()),
            camera.label()
        )
    }
}

/// Split recordings, already sorted by file name, into sessions.
///
/// A recording joins the current session when it starts at the same time
/// as the session's last recording, or within the consecutive threshold of
/// it. The one exception: unless `initial_impact` is set, a session made
/// only of impact recordings is closed by the first non-impact recording,
/// so a parking impact does not get glued onto the next drive.
pub fn group_recordings<I>(recordings: I, options: &GroupingOptions) -> Vec<Session>
where
    I: IntoIterator<Item = Recording>,
{
    let mut sessions: Vec<Session> = Vec::new();

    for rec in recordings {
        let Some(current) = sessions.last_mut() else {
            sessions.push(Session::open(rec));
            continue;
        };

        let previous = current.last().recorded_at;
        if rec.recorded_at == previous {
            current.recordings.push(rec);
            continue;
        }

        let gap = (rec.recorded_at - previous).num_seconds();
        if gap > options.consecutive_threshold_secs {
            sessions.push(Session::open(rec));
            continue;
        }

        if options.initial_impact || !current.is_impact_only() || rec.is_impact() {
            current.recordings.push(rec);
        } else {
            sessions.push(Session::open(rec));
        }
    }

    sessions
}
