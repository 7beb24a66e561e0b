// Export components
pub mod calendar;
pub mod chat;
pub mod spreadsheet;

// Re-export the client seams used by the routes
pub use calendar::{CalendarWebhook, HttpCalendarWebhook};
pub use chat::{ChatCompletion, RigChatClient};
