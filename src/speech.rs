use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CallError;

/// Utterance volume used for every spoken line.
pub const SPEECH_VOLUME: f32 = 0.8;
const PRE_UTTERANCE_DELAY: Duration = Duration::from_millis(200);
const POST_UTTERANCE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VoicePersona {
    Maya,
    Friend,
    Family,
    Professional,
}

impl Default for VoicePersona {
    fn default() -> Self {
        VoicePersona::Maya
    }
}

impl VoicePersona {
    pub fn pitch_multiplier(&self) -> f32 {
        match self {
            VoicePersona::Maya => 1.1,
            VoicePersona::Friend => 1.0,
            VoicePersona::Family => 0.9,
            VoicePersona::Professional => 0.95,
        }
    }

    pub fn speech_rate(&self) -> f32 {
        match self {
            VoicePersona::Maya => 0.5,
            VoicePersona::Friend => 0.52,
            VoicePersona::Family => 0.48,
            VoicePersona::Professional => 0.5,
        }
    }

    pub fn language(&self) -> &'static str {
        match self {
            VoicePersona::Maya | VoicePersona::Professional => "en-US",
            VoicePersona::Friend => "en-GB",
            VoicePersona::Family => "en-AU",
        }
    }

    /// Platform voices to try in order before falling back to `language()`.
    pub fn preferred_voices(&self) -> &'static [&'static str] {
        match self {
            VoicePersona::Maya => &[
                "com.apple.voice.premium.en-US.Zoe",
                "com.apple.voice.enhanced.en-US.Samantha",
                "com.apple.ttsbundle.Samantha-premium",
            ],
            VoicePersona::Friend => &[
                "com.apple.voice.premium.en-GB.Serena",
                "com.apple.voice.enhanced.en-GB.Kate",
                "com.apple.ttsbundle.Kate-premium",
            ],
            VoicePersona::Family => &[
                "com.apple.voice.premium.en-AU.Karen",
                "com.apple.voice.enhanced.en-AU.Catherine",
                "com.apple.ttsbundle.Catherine-premium",
            ],
            VoicePersona::Professional => &[
                "com.apple.voice.premium.en-US.Ava",
                "com.apple.voice.enhanced.en-US.Allison",
                "com.apple.ttsbundle.Allison-premium",
            ],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VoicePersona::Maya => "Maya",
            VoicePersona::Friend => "Friend",
            VoicePersona::Family => "Family",
            VoicePersona::Professional => "Professional",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VoicePersona::Maya => "Warm, supportive AI companion",
            VoicePersona::Friend => "Casual, friendly conversation partner",
            VoicePersona::Family => "Caring, familiar voice",
            VoicePersona::Professional => "Clear, professional tone",
        }
    }
}

/// One utterance handed to the synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub text: String,
    pub persona: VoicePersona,
    pub rate: f32,
    pub pitch_multiplier: f32,
    pub volume: f32,
    pub pre_utterance_delay: Duration,
    pub post_utterance_delay: Duration,
}

impl SpeechRequest {
    /// `None` for blank text; the engine is never asked to say nothing.
    pub fn new(text: &str, persona: VoicePersona) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            persona,
            rate: persona.speech_rate(),
            pitch_multiplier: persona.pitch_multiplier(),
            volume: SPEECH_VOLUME,
            pre_utterance_delay: PRE_UTTERANCE_DELAY,
            post_utterance_delay: POST_UTTERANCE_DELAY,
        })
    }
}

/// Text-to-speech engine. Fire-and-forget: `speak` queues and returns.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, request: SpeechRequest) -> Result<(), CallError>;

    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_persona_voice_settings() {
        let request = SpeechRequest::new("Almost home?", VoicePersona::Family).unwrap();
        assert_eq!(request.rate, 0.48);
        assert_eq!(request.pitch_multiplier, 0.9);
        assert_eq!(request.volume, SPEECH_VOLUME);
        assert_eq!(request.pre_utterance_delay, Duration::from_millis(200));
        assert_eq!(request.post_utterance_delay, Duration::from_millis(300));
    }

    #[test]
    fn blank_text_is_not_spoken() {
        assert!(SpeechRequest::new("", VoicePersona::Maya).is_none());
        assert!(SpeechRequest::new("   ", VoicePersona::Maya).is_none());
    }

    #[test]
    fn every_persona_has_a_voice_fallback_chain() {
        for persona in [
            VoicePersona::Maya,
            VoicePersona::Friend,
            VoicePersona::Family,
            VoicePersona::Professional,
        ] {
            assert!(!persona.preferred_voices().is_empty());
            assert!(persona.language().starts_with("en-"));
        }
    }
}
