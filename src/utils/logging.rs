//! Logging macros gated on a per-module `ENABLE_LOGS` flag.
//!
//! A module opts in by declaring the flag and importing the macros from the crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//!
//! log_info!("call {} connected", call_id);
//! ```
//! With the flag off the calls compile away, which keeps chatty modules such as the
//! conversation loop quiet without touching `RUST_LOG`.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Used for swallowed side-effect failures (speech, display, recording).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
