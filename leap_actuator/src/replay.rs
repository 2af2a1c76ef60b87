//! Replay of recorded pose traces.
//!
//! Trace format (CSV, header required):
//!
//! ```text
//! timestamp_ms,px,py,pz,vx,vy,vz,grab,tap
//! 0,12.5,140.0,-3.0,150.0,0.0,0.0,0.0,0
//! 9,,,,,,,,0
//! ```
//!
//! A row with empty position/velocity columns is a frame with no hand in
//! view. `tap` is 0 or 1.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::info;
use serde::Deserialize;
use thiserror::Error;

use motion_core::{GestureEvent, HandFrame, PoseSample, Vector3};

use crate::source::{SampleSource, SourceEvent, SourceSender};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("cannot read trace {}: {source}", path.display())]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("trace {} contains no frames", .0.display())]
    Empty(PathBuf),

    #[error("trace {}: timestamps go backwards at row {row}", path.display())]
    NonMonotonic { path: PathBuf, row: usize },
}

#[derive(Debug, Deserialize)]
struct TraceRow {
    timestamp_ms: i64,
    px:   Option<f32>,
    py:   Option<f32>,
    pz:   Option<f32>,
    vx:   Option<f32>,
    vy:   Option<f32>,
    vz:   Option<f32>,
    grab: Option<f32>,
    #[serde(default)]
    tap:  u8,
}

impl TraceRow {
    fn into_frame(self) -> HandFrame {
        let t = self.timestamp_ms;
        let mut frame = HandFrame::empty(t);
        if let (Some(px), Some(py), Some(pz)) = (self.px, self.py, self.pz) {
            let velocity = Vector3::new(
                self.vx.unwrap_or(0.0),
                self.vy.unwrap_or(0.0),
                self.vz.unwrap_or(0.0),
            );
            frame.hands.push(PoseSample::new(
                Vector3::new(px, py, pz),
                velocity,
                self.grab.unwrap_or(0.0),
                t,
            ));
        }
        if self.tap != 0 {
            frame.gestures.push(GestureEvent::tap(t));
        }
        frame
    }
}

/// Read a whole trace into memory.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<HandFrame>, ReplayError> {
    let path = path.as_ref();
    let csv_err = |source: csv::Error| ReplayError::Csv { path: path.to_path_buf(), source };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut frames: Vec<HandFrame> = Vec::new();
    for (idx, row) in reader.deserialize::<TraceRow>().enumerate() {
        let frame = row.map_err(csv_err)?.into_frame();
        if let Some(prev) = frames.last() {
            if frame.timestamp_ms < prev.timestamp_ms {
                return Err(ReplayError::NonMonotonic { path: path.to_path_buf(), row: idx + 1 });
            }
        }
        frames.push(frame);
    }

    if frames.is_empty() {
        return Err(ReplayError::Empty(path.to_path_buf()));
    }
    Ok(frames)
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySampleSource
// ════════════════════════════════════════════════════════════════════════════

/// Plays back a loaded trace with its original timing.
pub struct ReplaySampleSource {
    frames: Vec<HandFrame>,
    /// Playback speed multiplier; 0 means no pacing at all.
    speed:  f32,
}

impl ReplaySampleSource {
    pub fn new(frames: Vec<HandFrame>, speed: f32) -> Self {
        ReplaySampleSource { frames, speed: speed.max(0.0) }
    }

    pub fn from_path(path: impl AsRef<Path>, speed: f32) -> Result<Self, ReplayError> {
        let frames = load_trace(path)?;
        Ok(ReplaySampleSource::new(frames, speed))
    }

    fn gap(&self, from_ms: i64, to_ms: i64) -> Option<Duration> {
        if self.speed <= 0.0 || to_ms <= from_ms {
            return None;
        }
        Some(Duration::from_secs_f32((to_ms - from_ms) as f32 / 1000.0 / self.speed))
    }
}

impl SampleSource for ReplaySampleSource {
    fn run(self: Box<Self>, tx: SourceSender) {
        info!("replaying {} frames at {}x", self.frames.len(), self.speed);
        if !tx.send(SourceEvent::Connected) { return; }

        let mut prev_ts: Option<i64> = None;
        for frame in &self.frames {
            if let Some(wait) = prev_ts.and_then(|p| self.gap(p, frame.timestamp_ms)) {
                thread::sleep(wait);
            }
            prev_ts = Some(frame.timestamp_ms);
            if !tx.send(SourceEvent::Frame(frame.clone())) { return; }
        }
        tx.send(SourceEvent::Quit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::spawn_sample_source;
    use std::io::Write;

    fn write_trace(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    const HEADER: &str = "timestamp_ms,px,py,pz,vx,vy,vz,grab,tap\n";

    #[test]
    fn parses_hands_taps_and_empty_rows() {
        let f = write_trace(&format!(
            "{}0, 1.5, 140, -3, 150, 0, 0, 0.25, 0\n9,,,,,,,,1\n18,0,120,0,0,0,0,1,1\n",
            HEADER
        ));
        let frames = load_trace(f.path()).unwrap();
        assert_eq!(frames.len(), 3);

        let h = frames[0].hands[0];
        assert_eq!(h.position, Vector3::new(1.5, 140.0, -3.0));
        assert_eq!(h.velocity.x, 150.0);
        assert_eq!(h.grab_strength, 0.25);
        assert!(!frames[0].has_tap());

        assert!(frames[1].hands.is_empty());
        assert!(frames[1].has_tap());

        assert_eq!(frames[2].timestamp_ms, 18);
        assert!(frames[2].has_tap());
    }

    #[test]
    fn empty_trace_rejected() {
        let f = write_trace(HEADER);
        assert!(matches!(load_trace(f.path()), Err(ReplayError::Empty(_))));
    }

    #[test]
    fn backwards_timestamps_rejected() {
        let f = write_trace(&format!("{}10,0,0,0,0,0,0,0,0\n5,0,0,0,0,0,0,0,0\n", HEADER));
        assert!(matches!(
            load_trace(f.path()),
            Err(ReplayError::NonMonotonic { row: 2, .. })
        ));
    }

    #[test]
    fn malformed_row_reports_path() {
        let f = write_trace(&format!("{}abc,0,0,0,0,0,0,0,0\n", HEADER));
        let err = load_trace(f.path()).unwrap_err();
        assert!(err.to_string().contains(&f.path().display().to_string()));
    }

    #[test]
    fn unpaced_replay_delivers_everything_then_quits() {
        let frames: Vec<_> = (0..5).map(HandFrame::empty).collect();
        let handle = spawn_sample_source(ReplaySampleSource::new(frames, 0.0));
        let wait = Duration::from_secs(2);

        assert_eq!(handle.recv_timeout(wait).unwrap(), SourceEvent::Connected);
        for t in 0..5 {
            assert_eq!(handle.recv_timeout(wait).unwrap(), SourceEvent::Frame(HandFrame::empty(t)));
        }
        assert_eq!(handle.recv_timeout(wait).unwrap(), SourceEvent::Quit);
    }
}
