//! Collaborator doubles shared by the unit tests.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::{
    display::DisplaySink,
    error::CallError,
    recording::{RecordingFiles, RecordingService},
    speech::{SpeechOutput, SpeechRequest},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Show(String),
    Clear,
}

#[derive(Default)]
pub struct FakeDisplay {
    events: Mutex<Vec<(Instant, DisplayEvent)>>,
    failing: AtomicBool,
}

impl FakeDisplay {
    /// Records every call but reports each one as failed.
    pub fn failing() -> Self {
        let display = Self::default();
        display.failing.store(true, Ordering::SeqCst);
        display
    }

    fn outcome(&self) -> Result<(), CallError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CallError::Display("screen unavailable".into()));
        }
        Ok(())
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown_at().into_iter().map(|(_, line)| line).collect()
    }

    pub fn shown_at(&self) -> Vec<(Instant, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(at, event)| match event {
                DisplayEvent::Show(line) => Some((*at, line.clone())),
                DisplayEvent::Clear => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == DisplayEvent::Clear)
            .count()
    }
}

impl DisplaySink for FakeDisplay {
    fn show_line(&self, text: &str) -> Result<(), CallError> {
        self.events
            .lock()
            .unwrap()
            .push((Instant::now(), DisplayEvent::Show(text.to_string())));
        self.outcome()
    }

    fn clear_line(&self) -> Result<(), CallError> {
        self.events
            .lock()
            .unwrap()
            .push((Instant::now(), DisplayEvent::Clear));
        self.outcome()
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    spoken: Mutex<Vec<SpeechRequest>>,
    stops: AtomicUsize,
    failing: AtomicBool,
}

impl FakeSpeech {
    pub fn failing() -> Self {
        let speech = Self::default();
        speech.failing.store(true, Ordering::SeqCst);
        speech
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.text.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechOutput for FakeSpeech {
    fn speak(&self, request: SpeechRequest) -> Result<(), CallError> {
        self.spoken.lock().unwrap().push(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CallError::Speech("engine unavailable".into()));
        }
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeRecorder {
    recording: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    fail_start: AtomicBool,
}

impl FakeRecorder {
    pub fn failing_start() -> Self {
        let recorder = Self::default();
        recorder.fail_start.store(true, Ordering::SeqCst);
        recorder
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl RecordingService for FakeRecorder {
    fn start_recording(&self) -> Result<(), CallError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(CallError::Recording("capture session failed".into()));
        }
        self.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_recording(&self) -> Result<RecordingFiles, CallError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if !self.recording.swap(false, Ordering::SeqCst) {
            return Err(CallError::Recording("not recording".into()));
        }
        Ok(RecordingFiles {
            front: PathBuf::from("front_test.mp4"),
            back: PathBuf::from("back_test.mp4"),
        })
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

/// Moves the paused clock forward and lets woken tasks run.
pub async fn advance(by: Duration) {
    time::sleep(by).await;
    settle().await;
}

pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
