use std::time::Duration;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::scenarios::{CallScript, FILLER_LINES};

use super::pacing::ConversationPacing;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConversationMode {
    Scripted,
    Filler,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum LineSource {
    Script { index: usize },
    Filler,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredLine {
    /// Increments with every line of the call, scripted or filler.
    pub seq: u64,
    pub text: String,
    pub source: LineSource,
}

/// Position in a script. Once `next_index` reaches the end it stays there and every
/// further line is filler.
#[derive(Debug, Clone)]
pub struct ConversationCursor {
    script: CallScript,
    next_index: usize,
    delivered: u64,
}

impl ConversationCursor {
    pub fn new(script: CallScript) -> Self {
        Self {
            script,
            next_index: 0,
            delivered: 0,
        }
    }

    pub fn script(&self) -> &CallScript {
        &self.script
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn mode(&self) -> ConversationMode {
        if self.next_index >= self.script.len() {
            ConversationMode::Filler
        } else {
            ConversationMode::Scripted
        }
    }

    pub fn next_line<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DeliveredLine {
        let (text, source) = match self.script.line(self.next_index) {
            Some(line) => {
                let source = LineSource::Script {
                    index: self.next_index,
                };
                self.next_index += 1;
                (line.to_string(), source)
            }
            None => {
                let filler = FILLER_LINES.choose(rng).copied().unwrap_or("I'm here.");
                (filler.to_string(), LineSource::Filler)
            }
        };

        self.delivered += 1;
        DeliveredLine {
            seq: self.delivered,
            text,
            source,
        }
    }

    /// Wait before the line `next_line` would return.
    pub fn next_delay<R: Rng + ?Sized>(&self, pacing: &ConversationPacing, rng: &mut R) -> Duration {
        match self.mode() {
            ConversationMode::Scripted => pacing.scripted_delay.sample(rng),
            ConversationMode::Filler => pacing.filler_delay.sample(rng),
        }
    }
}
