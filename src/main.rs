//! Runs one simulated call in the terminal: lines are printed instead of shown, speech is
//! logged instead of synthesized, and there is no camera.

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};

use hersignal_lib::{
    display::DisplaySink,
    permissions::{missing_permissions, CaptureCapabilities, PermissionKind, PermissionService, PermissionStatus},
    recording::{RecordingFiles, RecordingService},
    speech::{SpeechOutput, SpeechRequest},
    CallCollaborators, CallController, CallError, ScenarioId, SettingsStore,
};

const DEFAULT_CALL_SECS: u64 = 60;

struct ConsoleDisplay;

impl DisplaySink for ConsoleDisplay {
    fn show_line(&self, text: &str) -> Result<(), CallError> {
        println!("  \u{1f4ac} {text}");
        Ok(())
    }

    fn clear_line(&self) -> Result<(), CallError> {
        Ok(())
    }
}

struct LoggedSpeech;

impl SpeechOutput for LoggedSpeech {
    fn speak(&self, request: SpeechRequest) -> Result<(), CallError> {
        info!(
            "speak [{} {} rate={} pitch={}]: {}",
            request.persona.display_name(),
            request.persona.language(),
            request.rate,
            request.pitch_multiplier,
            request.text
        );
        Ok(())
    }

    fn stop(&self) {
        info!("speech stopped");
    }
}

/// A terminal has no camera to record from.
struct NoCapture;

impl RecordingService for NoCapture {
    fn start_recording(&self) -> Result<(), CallError> {
        Err(CallError::PermissionUnavailable(PermissionKind::Camera))
    }

    fn stop_recording(&self) -> Result<RecordingFiles, CallError> {
        Err(CallError::Recording("nothing was recorded".into()))
    }

    fn is_recording(&self) -> bool {
        false
    }
}

struct HeadlessPermissions;

#[async_trait]
impl PermissionService for HeadlessPermissions {
    fn status(&self, kind: PermissionKind) -> PermissionStatus {
        match kind {
            PermissionKind::Notifications => PermissionStatus::Granted,
            _ => PermissionStatus::Restricted,
        }
    }

    async fn request(&self, kind: PermissionKind) -> PermissionStatus {
        self.status(kind)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    hersignal_lib::init_logging();

    let settings_path = env::var("HERSIGNAL_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("hersignal-settings.json"));
    let settings = SettingsStore::new(settings_path)?.call_settings();

    let scenario = match env::args().nth(1).or_else(|| env::var("HERSIGNAL_SCENARIO").ok()) {
        Some(name) => name.parse::<ScenarioId>()?,
        None => settings.default_scenario,
    };
    let call_secs = env::var("HERSIGNAL_CALL_SECS")
        .ok()
        .map(|value| value.parse::<u64>())
        .transpose()
        .context("HERSIGNAL_CALL_SECS must be a whole number of seconds")?
        .unwrap_or(DEFAULT_CALL_SECS);

    for missing in missing_permissions(&HeadlessPermissions) {
        warn!("setup: {missing}");
    }
    let capabilities = CaptureCapabilities::resolve(&HeadlessPermissions).await;

    let dismiss_delay = settings.dismiss_delay();
    let controller = CallController::new(
        settings,
        CallCollaborators {
            recorder: Arc::new(NoCapture),
            speech: Arc::new(LoggedSpeech),
            display: Arc::new(ConsoleDisplay),
        },
    )?;
    controller.set_capabilities(capabilities).await;

    let mut updates = controller.subscribe();
    let watcher = tokio::spawn(async move {
        let mut last = None;
        while updates.changed().await.is_ok() {
            let current = updates
                .borrow()
                .as_ref()
                .map(|snapshot| (snapshot.session.state, snapshot.formatted_duration.clone()));
            let state = current.as_ref().map(|(state, _)| *state);
            if state != last {
                match current {
                    Some((state, duration)) => info!("call {state:?} [{duration}]"),
                    None => info!("call screen dismissed"),
                }
                last = state;
            }
        }
    });

    println!("Incoming call: {} ({})", controller.settings().voice.display_name(), scenario.title());
    controller.ring(scenario).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("hanging up"),
        _ = tokio::time::sleep(Duration::from_secs(call_secs)) => {}
    }

    match controller.end_call().await {
        Ok(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
        Err(err) => warn!("{err}"),
    }

    tokio::time::sleep(dismiss_delay).await;
    watcher.abort();
    Ok(())
}
