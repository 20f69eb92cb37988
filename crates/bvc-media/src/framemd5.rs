//! Parsing of ffmpeg `framemd5` output.
//!
//! BlackVue clips overlap: the first frames of a clip repeat the last
//! frame of the previous one. Hashing every packet lets us find where the
//! new material starts without decoding.
//!
//! ```text
//! #tb 0: 1/90000
//! #media_type 0: video
//! 0,          0,          0,     3003,   204718, 0f6a2e3c...
//! ```

use tracing::debug;

/// One hashed packet.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDigest {
    /// Presentation time in seconds
    pub pts_secs: f64,
    /// MD5 of the packet payload
    pub hash: String,
}

/// Parse `framemd5` output into frame digests.
///
/// Each `#tb` line sets the time base for the data lines that follow it.
/// Malformed data lines are skipped.
pub fn parse_framemd5(output: &str) -> Vec<FrameDigest> {
    let (mut tb_num, mut tb_den) = (1.0_f64, 1.0_f64);
    let mut frames = Vec::new();

    for line in output.lines() {
        if line.starts_with("#tb") {
            match line.split_whitespace().last().and_then(parse_time_base) {
                Some((num, den)) => (tb_num, tb_den) = (num, den),
                None => debug!("Ignoring malformed time base line: {}", line),
            }
            continue;
        }
        if line.starts_with('#') || line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        let pts = fields.get(2).and_then(|f| f.trim().parse::<f64>().ok());
        match (pts, fields.last()) {
            (Some(pts), Some(hash)) if fields.len() > 3 => frames.push(FrameDigest {
                pts_secs: pts * tb_num / tb_den,
                hash: hash.trim().to_string(),
            }),
            _ => debug!("Ignoring malformed framemd5 line: {}", line),
        }
    }

    frames
}

fn parse_time_base(value: &str) -> Option<(f64, f64)> {
    let (num, den) = value.split_once('/')?;
    let num: i64 = num.parse().ok()?;
    let den: i64 = den.parse().ok()?;
    (den != 0).then_some((num as f64, den as f64))
}

/// In-point of a clip given the last frame hash of the clip before it.
///
/// This is the timestamp of the last frame repeating that hash, or 0 when
/// nothing repeats (or there is no previous clip).
pub fn find_inpoint(frames: &[FrameDigest], previous_last_hash: Option<&str>) -> f64 {
    let Some(previous) = previous_last_hash else {
        return 0.0;
    };
    frames
        .iter()
        .rev()
        .find(|frame| frame.hash == previous)
        .map_or(0.0, |frame| frame.pts_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#format: frame checksums
#version: 2
#hash: MD5
#tb 0: 1/90000
#media_type 0: video
#codec_id 0: h264
#dimensions 0: 1920x1080
#sar 0: 1/1
#stream#, dts,        pts, duration,     size, hash
0,          0,          0,     3003,   204718, aaaa
0,       3003,       3003,     3003,    12000, bbbb
0,       6006,       6006,     3003,    12000, cccc
";

    #[test]
    fn test_parse_framemd5() {
        let frames = parse_framemd5(SAMPLE);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].hash, "aaaa");
        assert_eq!(frames[0].pts_secs, 0.0);
        assert!((frames[2].pts_secs - 6006.0 / 90000.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_base_switch_and_garbage() {
        let frames = parse_framemd5("#tb 0: 1/1000\n0, 0, 500, 1, 1, x\nnot,a frame\n#tb 0: 1/0\n0, 0, 1000, 1, 1, y\n");

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pts_secs, 0.5);
        // A zero denominator keeps the previous time base
        assert_eq!(frames[1].pts_secs, 1.0);
    }

    #[test]
    fn test_find_inpoint() {
        let frames = parse_framemd5(SAMPLE);

        assert_eq!(find_inpoint(&frames, None), 0.0);
        assert_eq!(find_inpoint(&frames, Some("zzzz")), 0.0);
        assert!((find_inpoint(&frames, Some("bbbb")) - 3003.0 / 90000.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_inpoint_takes_last_repeat() {
        let frames = vec![
            FrameDigest { pts_secs: 0.0, hash: "dup".into() },
            FrameDigest { pts_secs: 0.1, hash: "dup".into() },
            FrameDigest { pts_secs: 0.2, hash: "new".into() },
        ];
        assert_eq!(find_inpoint(&frames, Some("dup")), 0.1);
    }
}
