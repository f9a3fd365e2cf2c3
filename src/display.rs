use crate::error::CallError;

/// Where the caller's current line is shown on the call screen.
pub trait DisplaySink: Send + Sync {
    fn show_line(&self, text: &str) -> Result<(), CallError>;

    fn clear_line(&self) -> Result<(), CallError>;
}
