use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    permissions::CaptureCapabilities,
    recording::{CameraPosition, RecordingFiles},
    scenarios::ScenarioId,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CallState {
    Ringing,
    Connecting,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    HungUp,
    Declined,
    MaxDuration,
    Dismissed,
}

/// One simulated call, from the first ring to the ended screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSession {
    pub id: String,
    pub scenario: ScenarioId,
    pub state: CallState,
    /// Set when the call starts connecting; `None` while it is still ringing.
    pub started_at: Option<DateTime<Utc>>,
    pub connected_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub is_muted: bool,
    pub is_speaker_on: bool,
    /// Preview visibility only. Capture keeps running when this is off.
    pub is_camera_on: bool,
    pub primary_camera: CameraPosition,
    pub capabilities: CaptureCapabilities,
    pub end_reason: Option<EndReason>,
}

impl CallSession {
    fn new(
        id: String,
        scenario: ScenarioId,
        state: CallState,
        started_at: Option<DateTime<Utc>>,
        capabilities: CaptureCapabilities,
    ) -> Self {
        Self {
            id,
            scenario,
            state,
            started_at,
            connected_at: None,
            ended_at: None,
            duration_seconds: 0,
            is_muted: false,
            is_speaker_on: false,
            is_camera_on: capabilities.camera,
            primary_camera: CameraPosition::Front,
            capabilities,
            end_reason: None,
        }
    }

    pub fn ringing(id: String, scenario: ScenarioId, capabilities: CaptureCapabilities) -> Self {
        Self::new(id, scenario, CallState::Ringing, None, capabilities)
    }

    pub fn connecting(
        id: String,
        scenario: ScenarioId,
        capabilities: CaptureCapabilities,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(id, scenario, CallState::Connecting, Some(now), capabilities)
    }

    pub fn is_live(&self) -> bool {
        self.state != CallState::Ended
    }

    /// Ringing -> Connecting. False from any other state.
    pub fn answer(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != CallState::Ringing {
            return false;
        }
        self.state = CallState::Connecting;
        self.started_at = Some(now);
        true
    }

    /// Connecting -> Active. False from any other state.
    pub fn connect(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != CallState::Connecting {
            return false;
        }
        self.state = CallState::Active;
        self.connected_at = Some(now);
        true
    }

    /// Counts one second of talk time; only an active call accumulates duration.
    pub fn tick(&mut self) -> bool {
        if self.state != CallState::Active {
            return false;
        }
        self.duration_seconds += 1;
        true
    }

    /// Any live state -> Ended. `Ended` is terminal, so a second call returns false.
    pub fn end(&mut self, reason: EndReason, now: DateTime<Utc>) -> bool {
        if !self.is_live() {
            return false;
        }
        self.state = CallState::Ended;
        self.ended_at = Some(now);
        self.end_reason = Some(reason);
        true
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.is_muted = !self.is_muted;
        self.is_muted
    }

    pub fn toggle_speaker(&mut self) -> bool {
        self.is_speaker_on = !self.is_speaker_on;
        self.is_speaker_on
    }

    /// Without camera permission there is no preview to show, so this stays off.
    pub fn toggle_camera(&mut self) -> bool {
        if !self.capabilities.camera {
            return false;
        }
        self.is_camera_on = !self.is_camera_on;
        self.is_camera_on
    }

    pub fn switch_camera(&mut self) -> CameraPosition {
        self.primary_camera = self.primary_camera.flipped();
        self.primary_camera
    }

    pub fn formatted_duration(&self) -> String {
        format_call_duration(self.duration_seconds)
    }
}

/// `MM:SS`; minutes keep counting past 59.
pub fn format_call_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// What the call screen renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSnapshot {
    #[serde(flatten)]
    pub session: CallSession,
    pub formatted_duration: String,
    pub is_recording: bool,
}

impl CallSnapshot {
    pub fn new(session: &CallSession, is_recording: bool) -> Self {
        Self {
            formatted_duration: session.formatted_duration(),
            session: session.clone(),
            is_recording,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallSummary {
    pub call_id: String,
    pub scenario: ScenarioId,
    pub started_at: Option<DateTime<Utc>>,
    pub connected_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub reason: EndReason,
    pub recording: Option<RecordingFiles>,
}
