//! Core of a simulated safety call: a scripted caller who talks at a human pace while the
//! phone records both cameras.

pub mod call;
pub mod conversation;
pub mod display;
pub mod error;
pub mod permissions;
pub mod recording;
pub mod scenarios;
pub mod settings;
pub mod speech;
mod utils;

#[cfg(test)]
mod testing;

pub use call::{CallCollaborators, CallController, CallSnapshot, CallState, CallSummary, EndReason};
pub use conversation::{ConversationPacing, ConversationScheduler};
pub use error::CallError;
pub use scenarios::{get_script, CallScript, ScenarioId};
pub use settings::{CallSettings, SettingsStore};

/// Logs at info by default; `RUST_LOG` overrides.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
