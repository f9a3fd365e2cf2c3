//! Static catalog of call scenarios and the scripted lines each one opens with.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CallError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    WalkingSafety,
    PublicTransport,
    LateNight,
    General,
}

impl Default for ScenarioId {
    fn default() -> Self {
        ScenarioId::WalkingSafety
    }
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 4] = [
        ScenarioId::WalkingSafety,
        ScenarioId::PublicTransport,
        ScenarioId::LateNight,
        ScenarioId::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::WalkingSafety => "walking_safety",
            ScenarioId::PublicTransport => "public_transport",
            ScenarioId::LateNight => "late_night",
            ScenarioId::General => "general",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ScenarioId::WalkingSafety => "Walking home",
            ScenarioId::PublicTransport => "Public transport",
            ScenarioId::LateNight => "Late night check-in",
            ScenarioId::General => "General chat",
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioId {
    type Err = CallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| CallError::config(format!("unknown scenario `{s}`")))
    }
}

/// Ordered lines spoken by the caller for one scenario. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallScript {
    scenario: ScenarioId,
    lines: Vec<String>,
}

impl CallScript {
    pub fn new(scenario: ScenarioId, lines: Vec<String>) -> Result<Self, CallError> {
        if lines.is_empty() {
            return Err(CallError::config(format!(
                "script for `{scenario}` has no lines"
            )));
        }
        Ok(Self { scenario, lines })
    }

    pub fn scenario(&self) -> ScenarioId {
        self.scenario
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

/// Generic reassurance lines used once a script runs out.
pub const FILLER_LINES: [&str; 5] = [
    "Are you doing okay?",
    "I'm still here with you.",
    "How much further do you have to go?",
    "Let me know if you need anything.",
    "I'll stay on the line.",
];

fn catalog_lines(id: ScenarioId) -> &'static [&'static str] {
    match id {
        ScenarioId::WalkingSafety => &[
            "Hey! How's your evening walk going?",
            "The weather looks really nice tonight.",
            "I'm just getting ready to head out myself.",
            "Are you still planning to meet up later?",
            "Oh, I think I see you up ahead!",
        ],
        ScenarioId::PublicTransport => &[
            "Hi! Are you on the bus already?",
            "I'm running a few minutes late.",
            "Which stop are you getting off at?",
            "I'll meet you at the station.",
            "Text me when you're close!",
        ],
        ScenarioId::LateNight => &[
            "Hey, just wanted to check in on you.",
            "I know it's late, but I wanted to make sure you got home safely.",
            "Did you get an Uber or are you walking?",
            "I'm here if you need me to stay on the line.",
            "Almost home?",
        ],
        ScenarioId::General => &[
            "Hi! How are you doing?",
            "I was just thinking about you.",
            "What are you up to right now?",
            "I'm free to chat for a while.",
            "Is everything going okay?",
        ],
    }
}

/// Script for a scenario. The match in `catalog_lines` is exhaustive, so a new
/// `ScenarioId` without lines fails to compile; the tests below catch an empty entry.
pub fn get_script(id: ScenarioId) -> CallScript {
    CallScript {
        scenario: id,
        lines: catalog_lines(id).iter().map(|line| line.to_string()).collect(),
    }
}
