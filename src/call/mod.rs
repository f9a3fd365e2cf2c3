pub mod controller;
pub mod state;

pub use controller::{CallCollaborators, CallController};
pub use state::{
    format_call_duration, CallSession, CallSnapshot, CallState, CallSummary, EndReason,
};
