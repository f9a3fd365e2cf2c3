use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use tokio::{
    sync::{watch, Mutex},
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    conversation::{ConversationPacing, ConversationProgress, ConversationScheduler},
    display::DisplaySink,
    permissions::CaptureCapabilities,
    recording::{CameraPosition, RecordingService},
    scenarios::{get_script, ScenarioId},
    settings::CallSettings,
    speech::SpeechOutput,
};

use super::state::{CallSession, CallSnapshot, CallState, CallSummary, EndReason};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Platform services a call drives.
#[derive(Clone)]
pub struct CallCollaborators {
    pub recorder: Arc<dyn RecordingService>,
    pub speech: Arc<dyn SpeechOutput>,
    pub display: Arc<dyn DisplaySink>,
}

struct LiveCall {
    session: CallSession,
    /// Connect delay and duration ticker. Cancelled when the call ends.
    timers: CancellationToken,
    /// Child of `timers`, cancelled early once the call is answered.
    auto_answer: Option<CancellationToken>,
    /// Pending removal of the ended screen.
    dismissal: CancellationToken,
}

impl LiveCall {
    fn new(session: CallSession) -> Self {
        Self {
            session,
            timers: CancellationToken::new(),
            auto_answer: None,
            dismissal: CancellationToken::new(),
        }
    }
}

enum TickOutcome {
    Continue,
    LimitReached,
    Stop,
}

/// Owns the call lifecycle and keeps conversation, recording and the call screen in step
/// with it. Cloning shares the same call.
#[derive(Clone)]
pub struct CallController {
    call: Arc<Mutex<Option<LiveCall>>>,
    scheduler: Arc<Mutex<ConversationScheduler>>,
    recorder: Arc<dyn RecordingService>,
    speech: Arc<dyn SpeechOutput>,
    display: Arc<dyn DisplaySink>,
    capabilities: Arc<Mutex<CaptureCapabilities>>,
    settings: CallSettings,
    snapshot_tx: Arc<watch::Sender<Option<CallSnapshot>>>,
}

impl CallController {
    pub fn new(settings: CallSettings, collaborators: CallCollaborators) -> Result<Self> {
        Self::with_pacing(settings, collaborators, ConversationPacing::default(), None)
    }

    /// `seed` makes line timing and filler choice reproducible.
    pub fn with_pacing(
        settings: CallSettings,
        collaborators: CallCollaborators,
        pacing: ConversationPacing,
        seed: Option<u64>,
    ) -> Result<Self> {
        settings.validate()?;
        pacing.validate()?;

        let CallCollaborators {
            recorder,
            speech,
            display,
        } = collaborators;

        let mut scheduler =
            ConversationScheduler::new(pacing, display.clone(), speech.clone(), settings.voice);
        if let Some(seed) = seed {
            scheduler = scheduler.with_seed(seed);
        }

        let (snapshot_tx, _) = watch::channel(None);

        Ok(Self {
            call: Arc::new(Mutex::new(None)),
            scheduler: Arc::new(Mutex::new(scheduler)),
            recorder,
            speech,
            display,
            capabilities: Arc::new(Mutex::new(CaptureCapabilities::full())),
            settings,
            snapshot_tx: Arc::new(snapshot_tx),
        })
    }

    pub fn settings(&self) -> &CallSettings {
        &self.settings
    }

    /// Applies to calls started after this point.
    pub async fn set_capabilities(&self, capabilities: CaptureCapabilities) {
        *self.capabilities.lock().await = capabilities;
    }

    /// Current call, `None` once the ended screen has been dismissed.
    pub fn subscribe(&self) -> watch::Receiver<Option<CallSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub async fn snapshot(&self) -> Option<CallSnapshot> {
        let guard = self.call.lock().await;
        guard
            .as_ref()
            .map(|live| CallSnapshot::new(&live.session, self.recorder.is_recording()))
    }

    pub async fn conversation_progress(&self) -> Option<ConversationProgress> {
        self.scheduler.lock().await.progress()
    }

    /// Presents an incoming call. It answers itself after the auto-answer delay.
    pub async fn ring(&self, scenario: ScenarioId) -> Result<CallSnapshot> {
        let capabilities = *self.capabilities.lock().await;
        let mut guard = self.call.lock().await;
        self.make_room(&mut guard)?;

        let mut live = LiveCall::new(CallSession::ringing(new_call_id(), scenario, capabilities));
        let auto_answer = live.timers.child_token();
        self.spawn_auto_answer(live.session.id.clone(), auto_answer.clone());
        live.auto_answer = Some(auto_answer);

        log_info!("call {} ringing ({scenario})", live.session.id);
        let snapshot = self.publish_live(&live.session);
        *guard = Some(live);
        Ok(snapshot)
    }

    pub async fn answer(&self) -> Result<CallSnapshot> {
        self.answer_call(None).await
    }

    /// Starts a call straight into connecting: recording and conversation begin now,
    /// the call turns active after the connect delay.
    pub async fn start_call(&self, scenario: ScenarioId) -> Result<CallSnapshot> {
        let capabilities = *self.capabilities.lock().await;
        let mut guard = self.call.lock().await;
        self.make_room(&mut guard)?;

        let live = LiveCall::new(CallSession::connecting(
            new_call_id(),
            scenario,
            capabilities,
            Utc::now(),
        ));
        log_info!("call {} connecting ({scenario})", live.session.id);
        self.begin_connecting(&live).await;

        let snapshot = self.publish_live(&live.session);
        *guard = Some(live);
        Ok(snapshot)
    }

    pub async fn end_call(&self) -> Result<CallSummary> {
        self.finish(None, EndReason::HungUp).await
    }

    /// Rejects a call that has not connected yet. It never becomes active.
    pub async fn decline(&self) -> Result<CallSummary> {
        self.finish(None, EndReason::Declined).await
    }

    /// The call screen went away: end a live call and drop the session without waiting.
    pub async fn dismiss(&self) -> Result<Option<CallSummary>> {
        let live_id = {
            let guard = self.call.lock().await;
            guard
                .as_ref()
                .filter(|live| live.session.is_live())
                .map(|live| live.session.id.clone())
        };

        let summary = match live_id {
            Some(call_id) => Some(self.finish(Some(&call_id), EndReason::Dismissed).await?),
            None => None,
        };
        self.discard(None).await;
        Ok(summary)
    }

    pub async fn toggle_mute(&self) -> Result<bool> {
        self.update_live(CallSession::toggle_mute).await
    }

    pub async fn toggle_speaker(&self) -> Result<bool> {
        self.update_live(CallSession::toggle_speaker).await
    }

    /// Hides or shows the preview. Recording is left running either way.
    pub async fn toggle_camera(&self) -> Result<bool> {
        self.update_live(CallSession::toggle_camera).await
    }

    /// Swaps which feed is the large view; both feeds keep recording.
    pub async fn switch_camera(&self) -> Result<CameraPosition> {
        self.update_live(CallSession::switch_camera).await
    }

    fn make_room(&self, slot: &mut Option<LiveCall>) -> Result<()> {
        match slot.as_ref() {
            Some(live) if live.session.is_live() => bail!("call already in progress"),
            Some(live) => {
                live.dismissal.cancel();
                *slot = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn answer_call(&self, expected_id: Option<&str>) -> Result<CallSnapshot> {
        let mut guard = self.call.lock().await;
        let live = guard
            .as_mut()
            .filter(|live| expected_id.map_or(true, |id| live.session.id == id))
            .ok_or_else(|| anyhow!("no incoming call to answer"))?;

        if !live.session.answer(Utc::now()) {
            bail!("call is not ringing");
        }
        if let Some(token) = live.auto_answer.take() {
            token.cancel();
        }

        log_info!("call {} answered", live.session.id);
        self.begin_connecting(live).await;
        Ok(self.publish_live(&live.session))
    }

    /// Side effects of entering `Connecting`. Recording starts before the call shows as
    /// active; none of these failures stop the call.
    async fn begin_connecting(&self, live: &LiveCall) {
        let session = &live.session;

        if session.capabilities.can_record() {
            if let Err(err) = self.recorder.start_recording() {
                log_error!("call {}: {err}; continuing without recording", session.id);
            }
        } else {
            log_warn!("call {}: no capture permission, speech-only call", session.id);
        }

        if let Err(err) = self
            .scheduler
            .lock()
            .await
            .start(get_script(session.scenario))
        {
            log_error!("call {}: conversation did not start: {err}", session.id);
        }

        self.spawn_call_clock(session.id.clone(), live.timers.clone());
    }

    async fn finish(&self, expected_id: Option<&str>, reason: EndReason) -> Result<CallSummary> {
        let mut guard = self.call.lock().await;
        let live = guard
            .as_mut()
            .filter(|live| live.session.is_live())
            .filter(|live| expected_id.map_or(true, |id| live.session.id == id))
            .ok_or_else(|| anyhow!("no active call to end"))?;

        if reason == EndReason::Declined && live.session.state == CallState::Active {
            bail!("call already connected; end it instead");
        }

        let ended_at = Utc::now();
        live.session.end(reason, ended_at);
        live.timers.cancel();

        self.scheduler.lock().await.stop();
        self.speech.stop();
        if let Err(err) = self.display.clear_line() {
            log_warn!("call {}: {err}", live.session.id);
        }

        let recording = if self.recorder.is_recording() {
            match self.recorder.stop_recording() {
                Ok(files) => Some(files),
                Err(err) => {
                    log_error!("call {}: {err}; recording may be incomplete", live.session.id);
                    None
                }
            }
        } else {
            None
        };

        log_info!(
            "call {} ended ({reason:?}) after {}s",
            live.session.id,
            live.session.duration_seconds
        );

        if reason != EndReason::Dismissed {
            self.spawn_dismissal(live.session.id.clone(), live.dismissal.clone());
        }
        self.publish_live(&live.session);

        Ok(CallSummary {
            call_id: live.session.id.clone(),
            scenario: live.session.scenario,
            started_at: live.session.started_at,
            connected_at: live.session.connected_at,
            ended_at,
            duration_seconds: live.session.duration_seconds,
            reason,
            recording,
        })
    }

    /// Drops an ended session. With `expected_id`, only if it is still that call.
    async fn discard(&self, expected_id: Option<&str>) -> bool {
        let mut guard = self.call.lock().await;
        let matches = guard.as_ref().is_some_and(|live| {
            !live.session.is_live() && expected_id.map_or(true, |id| live.session.id == id)
        });
        if !matches {
            return false;
        }

        if let Some(live) = guard.take() {
            live.dismissal.cancel();
            log_debug!("call {} dismissed", live.session.id);
        }
        self.snapshot_tx.send_replace(None);
        true
    }

    async fn mark_active(&self, call_id: &str) -> bool {
        let mut guard = self.call.lock().await;
        let Some(live) = guard.as_mut().filter(|live| live.session.id == call_id) else {
            return false;
        };
        if !live.session.connect(Utc::now()) {
            return false;
        }

        log_info!("call {call_id} connected");
        self.publish_live(&live.session);
        true
    }

    async fn tick(&self, call_id: &str) -> TickOutcome {
        let mut guard = self.call.lock().await;
        let Some(live) = guard.as_mut().filter(|live| live.session.id == call_id) else {
            return TickOutcome::Stop;
        };
        if !live.session.tick() {
            return TickOutcome::Stop;
        }

        self.publish_live(&live.session);
        if live.session.duration_seconds >= self.settings.max_call_duration_secs {
            TickOutcome::LimitReached
        } else {
            TickOutcome::Continue
        }
    }

    async fn update_live<T>(&self, apply: impl FnOnce(&mut CallSession) -> T + Send) -> Result<T> {
        let mut guard = self.call.lock().await;
        let live = guard
            .as_mut()
            .filter(|live| live.session.is_live())
            .ok_or_else(|| anyhow!("no active call"))?;

        let value = apply(&mut live.session);
        self.publish_live(&live.session);
        Ok(value)
    }

    fn spawn_auto_answer(&self, call_id: String, token: CancellationToken) {
        let controller = self.clone();
        let delay = self.settings.auto_answer_delay();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
            log_info!("call {call_id} not picked up; answering automatically");
            if let Err(err) = controller.answer_call(Some(&call_id)).await {
                log_debug!("auto-answer skipped for call {call_id}: {err}");
            }
        });
    }

    /// Connect delay, then one tick per second until the call ends or hits the limit.
    fn spawn_call_clock(&self, call_id: String, token: CancellationToken) {
        let controller = self.clone();
        let connect_delay = self.settings.connect_delay();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = time::sleep(connect_delay) => {}
            }
            if !controller.mark_active(&call_id).await {
                return;
            }

            let period = Duration::from_secs(1);
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => match controller.tick(&call_id).await {
                        TickOutcome::Continue => {}
                        TickOutcome::Stop => break,
                        TickOutcome::LimitReached => {
                            log_info!("call {call_id} reached the maximum duration");
                            if let Err(err) = controller
                                .finish(Some(&call_id), EndReason::MaxDuration)
                                .await
                            {
                                log_error!("failed to end call {call_id} at the limit: {err}");
                            }
                            break;
                        }
                    },
                }
            }
        });
    }

    fn spawn_dismissal(&self, call_id: String, token: CancellationToken) {
        let controller = self.clone();
        let delay = self.settings.dismiss_delay();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
            controller.discard(Some(&call_id)).await;
        });
    }

    fn publish_live(&self, session: &CallSession) -> CallSnapshot {
        let snapshot = CallSnapshot::new(session, self.recorder.is_recording());
        self.snapshot_tx.send_replace(Some(snapshot.clone()));
        snapshot
    }
}

fn new_call_id() -> String {
    Uuid::new_v4().to_string()
}
