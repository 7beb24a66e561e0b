mod batch;
mod classifier;
pub mod models;
mod webhook;

pub use batch::run_batch;
pub use classifier::{build_operation, classify, timestamp, Classification};
pub use models::{
    ActionKind, BatchOutcome, CalendarOperation, CalendarPayload, OperationResult,
    BATCH_COMPLETE_MESSAGE, SENTINEL_TITLE,
};
pub use webhook::{CalendarWebhook, HttpCalendarWebhook};
