use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{error::CallError, scenarios::ScenarioId, speech::VoicePersona};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallSettings {
    pub voice: VoicePersona,
    pub default_scenario: ScenarioId,
    /// An unanswered incoming call picks itself up after this long.
    pub auto_answer_delay_secs: f64,
    pub connect_delay_secs: f64,
    /// How long the ended screen stays up before the session is discarded.
    pub dismiss_delay_secs: f64,
    pub max_call_duration_secs: u64,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            voice: VoicePersona::Maya,
            default_scenario: ScenarioId::WalkingSafety,
            auto_answer_delay_secs: 3.0,
            connect_delay_secs: 2.0,
            dismiss_delay_secs: 1.5,
            max_call_duration_secs: 3600,
        }
    }
}

impl CallSettings {
    pub fn validate(&self) -> Result<(), CallError> {
        let delays = [
            ("autoAnswerDelaySecs", self.auto_answer_delay_secs),
            ("connectDelaySecs", self.connect_delay_secs),
            ("dismissDelaySecs", self.dismiss_delay_secs),
        ];
        for (name, secs) in delays {
            if !secs.is_finite() || secs < 0.0 {
                return Err(CallError::config(format!("{name} must be >= 0, got {secs}")));
            }
        }
        if self.max_call_duration_secs == 0 {
            return Err(CallError::config("maxCallDurationSecs must be > 0"));
        }
        Ok(())
    }

    pub fn auto_answer_delay(&self) -> Duration {
        Duration::from_secs_f64(self.auto_answer_delay_secs)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_secs_f64(self.connect_delay_secs)
    }

    pub fn dismiss_delay(&self) -> Duration {
        Duration::from_secs_f64(self.dismiss_delay_secs)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CallSettings>,
}

impl SettingsStore {
    /// Loads `path` if it exists. A file that does not parse or validate is replaced by
    /// defaults in memory and left untouched on disk.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<CallSettings>(&contents) {
                Ok(settings) if settings.validate().is_ok() => settings,
                Ok(_) | Err(_) => {
                    log_warn!(
                        "ignoring invalid settings in {}; using defaults",
                        path.display()
                    );
                    CallSettings::default()
                }
            }
        } else {
            CallSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn call_settings(&self) -> CallSettings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update_call_settings(&self, settings: CallSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: CallSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &CallSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
