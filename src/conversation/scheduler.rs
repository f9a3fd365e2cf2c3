use std::sync::Arc;

use anyhow::{bail, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    display::DisplaySink,
    scenarios::CallScript,
    speech::{SpeechOutput, SpeechRequest, VoicePersona},
};

use super::{
    cursor::{ConversationCursor, ConversationMode, DeliveredLine, LineSource},
    pacing::ConversationPacing,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "mode")]
pub enum SchedulerState {
    Idle,
    Running(ConversationMode),
}

/// Read-only view of a running conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationProgress {
    pub next_index: usize,
    pub script_len: usize,
    /// Cursor mode: what the next line will be.
    pub mode: ConversationMode,
    /// Kind of the latest line delivered. Turns to filler only on the tick that
    /// delivers the first filler line.
    pub phase: ConversationMode,
    pub delivered: u64,
    pub current_line: Option<DeliveredLine>,
}

impl ConversationProgress {
    fn from_cursor(cursor: &ConversationCursor, line: DeliveredLine) -> Self {
        let phase = match line.source {
            LineSource::Script { .. } => ConversationMode::Scripted,
            LineSource::Filler => ConversationMode::Filler,
        };
        Self {
            next_index: cursor.next_index(),
            script_len: cursor.script().len(),
            mode: cursor.mode(),
            phase,
            delivered: cursor.delivered(),
            current_line: Some(line),
        }
    }
}

/// Hands each line to the screen and the speech engine. Failures are logged and dropped
/// so one bad utterance never stalls the conversation.
#[derive(Clone)]
struct LineOutputs {
    display: Arc<dyn DisplaySink>,
    speech: Arc<dyn SpeechOutput>,
    persona: VoicePersona,
}

impl LineOutputs {
    fn deliver(&self, line: &DeliveredLine) {
        log_debug!("line #{} ({:?}): {}", line.seq, line.source, line.text);
        if let Err(err) = self.display.show_line(&line.text) {
            log_warn!("failed to show line #{}: {err}", line.seq);
        }
        if let Some(request) = SpeechRequest::new(&line.text, self.persona) {
            if let Err(err) = self.speech.speak(request) {
                log_warn!("failed to speak line #{}: {err}", line.seq);
            }
        }
    }

    fn clear(&self, seq: u64) {
        if let Err(err) = self.display.clear_line() {
            log_warn!("failed to clear line #{seq}: {err}");
        }
    }
}

/// Plays a script at a human cadence, then keeps the line alive with filler until stopped.
pub struct ConversationScheduler {
    pacing: ConversationPacing,
    outputs: LineOutputs,
    seed: Option<u64>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    progress_rx: Option<watch::Receiver<ConversationProgress>>,
}

impl ConversationScheduler {
    pub fn new(
        pacing: ConversationPacing,
        display: Arc<dyn DisplaySink>,
        speech: Arc<dyn SpeechOutput>,
        persona: VoicePersona,
    ) -> Self {
        Self {
            pacing,
            outputs: LineOutputs {
                display,
                speech,
                persona,
            },
            seed: None,
            handle: None,
            cancel_token: None,
            progress_rx: None,
        }
    }

    /// Fixes the random delays and filler picks, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_persona(&mut self, persona: VoicePersona) {
        self.outputs.persona = persona;
    }

    /// Delivers the first line right away and schedules the rest. Must run inside a
    /// tokio runtime. Fails without delivering anything when the pacing is invalid.
    pub fn start(&mut self, script: CallScript) -> Result<()> {
        if self.handle.is_some() {
            bail!("conversation already running");
        }
        self.pacing.validate()?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log_info!(
            "starting {} conversation ({} scripted lines)",
            script.scenario(),
            script.len()
        );

        let mut cursor = ConversationCursor::new(script);
        let first = cursor.next_line(&mut rng);
        self.outputs.deliver(&first);

        let now = Instant::now();
        let clear_at = now + self.pacing.display_duration(&first.text);
        let next_at = now + cursor.next_delay(&self.pacing, &mut rng);

        let (progress_tx, progress_rx) =
            watch::channel(ConversationProgress::from_cursor(&cursor, first.clone()));

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(conversation_loop(
            ConversationRun {
                cursor,
                outputs: self.outputs.clone(),
                pacing: self.pacing.clone(),
                rng,
                progress_tx,
                shown: Some((first.seq, clear_at)),
                next_at,
            },
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.progress_rx = Some(progress_rx);
        Ok(())
    }

    /// Cancels whatever is pending and forgets the conversation. No-op when idle.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log_info!("conversation stopped");
        }
        self.progress_rx = None;
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        match self.progress() {
            Some(progress) if self.is_running() => SchedulerState::Running(progress.phase),
            _ => SchedulerState::Idle,
        }
    }

    pub fn progress(&self) -> Option<ConversationProgress> {
        self.progress_rx.as_ref().map(|rx| rx.borrow().clone())
    }

    pub fn subscribe(&self) -> Option<watch::Receiver<ConversationProgress>> {
        self.progress_rx.clone()
    }
}

impl Drop for ConversationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ConversationRun {
    cursor: ConversationCursor,
    outputs: LineOutputs,
    pacing: ConversationPacing,
    rng: StdRng,
    progress_tx: watch::Sender<ConversationProgress>,
    /// Line on screen and when it should be cleared. Replaced on every delivery, so a
    /// clear can only ever apply to the newest line.
    shown: Option<(u64, Instant)>,
    next_at: Instant,
}

async fn conversation_loop(mut run: ConversationRun, cancel_token: CancellationToken) {
    loop {
        let clear_due = run.shown.map(|(_, at)| at);
        let clear = async move {
            match clear_due {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_debug!("conversation loop shutting down");
                break;
            }
            _ = clear => {
                if let Some((seq, _)) = run.shown.take() {
                    run.outputs.clear(seq);
                    run.progress_tx.send_modify(|progress| progress.current_line = None);
                }
            }
            _ = time::sleep_until(run.next_at) => {
                let was_scripted = run.cursor.mode() == ConversationMode::Scripted;
                let line = run.cursor.next_line(&mut run.rng);
                run.outputs.deliver(&line);

                if was_scripted && run.cursor.mode() == ConversationMode::Filler {
                    log_info!("script exhausted after {} lines; switching to filler", run.cursor.next_index());
                }

                let now = Instant::now();
                run.shown = Some((line.seq, now + run.pacing.display_duration(&line.text)));
                run.next_at = now + run.cursor.next_delay(&run.pacing, &mut run.rng);

                let progress = ConversationProgress::from_cursor(&run.cursor, line);
                run.progress_tx.send_replace(progress);
            }
        }
    }
}
