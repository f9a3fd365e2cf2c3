pub mod cursor;
pub mod pacing;
pub mod scheduler;

pub use cursor::{ConversationCursor, ConversationMode, DeliveredLine, LineSource};
pub use pacing::{ConversationPacing, DelayRange};
pub use scheduler::{ConversationProgress, ConversationScheduler, SchedulerState};
