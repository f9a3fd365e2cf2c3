use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CallError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CameraPosition {
    Front,
    Back,
}

impl Default for CameraPosition {
    fn default() -> Self {
        CameraPosition::Front
    }
}

impl CameraPosition {
    pub fn flipped(self) -> Self {
        match self {
            CameraPosition::Front => CameraPosition::Back,
            CameraPosition::Back => CameraPosition::Front,
        }
    }
}

/// Persisted output of one dual-camera recording.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingFiles {
    pub front: PathBuf,
    pub back: PathBuf,
}

impl RecordingFiles {
    /// `front_<unix-secs>.mp4` / `back_<unix-secs>.mp4` inside `dir`.
    pub fn timestamped(dir: &Path, at: DateTime<Utc>) -> Self {
        let stamp = at.timestamp();
        Self {
            front: dir.join(format!("front_{stamp}.mp4")),
            back: dir.join(format!("back_{stamp}.mp4")),
        }
    }
}

/// Dual-camera capture. Both feeds are recorded for the whole call whatever the call
/// screen shows; only the call controller starts and stops it.
pub trait RecordingService: Send + Sync {
    fn start_recording(&self) -> Result<(), CallError>;

    fn stop_recording(&self) -> Result<RecordingFiles, CallError>;

    fn is_recording(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn recording_files_are_named_by_start_second() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 22, 15, 0).unwrap();
        let files = RecordingFiles::timestamped(Path::new("/media"), at);
        assert_eq!(files.front, PathBuf::from("/media/front_1714601700.mp4"));
        assert_eq!(files.back, PathBuf::from("/media/back_1714601700.mp4"));
    }

    #[test]
    fn flipping_twice_returns_to_start() {
        let position = CameraPosition::default();
        assert_eq!(position.flipped(), CameraPosition::Back);
        assert_eq!(position.flipped().flipped(), CameraPosition::Front);
    }
}
