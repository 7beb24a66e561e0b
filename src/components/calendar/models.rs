use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only title that makes a row eligible for calendar changes ("free")
pub const SENTINEL_TITLE: &str = "空き";

/// Summary message returned after a batch completes
pub const BATCH_COMPLETE_MESSAGE: &str = "Googleカレンダー操作が完了しました。";

/// The operation kinds understood by the calendar webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Add,
    Delete,
    Update,
}

/// A classified calendar change for one spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarOperation {
    Add {
        summary: String,
        start: String,
        end: String,
    },
    Delete {
        event_id: String,
    },
    Update {
        event_id: String,
        summary: String,
        start: String,
        end: String,
    },
    /// The row's category label matched nothing
    Unknown { raw_label: String },
}

impl CalendarOperation {
    /// Build the webhook payload for this operation
    ///
    /// `Unknown` never reaches the webhook and has no payload.
    pub fn to_payload(&self) -> Option<CalendarPayload> {
        let payload = match self {
            CalendarOperation::Add {
                summary,
                start,
                end,
            } => CalendarPayload {
                action: ActionKind::Add,
                summary: Some(summary.clone()),
                start: Some(start.clone()),
                end: Some(end.clone()),
                event_id: None,
            },
            CalendarOperation::Delete { event_id } => CalendarPayload {
                action: ActionKind::Delete,
                summary: None,
                start: None,
                end: None,
                event_id: Some(event_id.clone()),
            },
            CalendarOperation::Update {
                event_id,
                summary,
                start,
                end,
            } => CalendarPayload {
                action: ActionKind::Update,
                summary: Some(summary.clone()),
                start: Some(start.clone()),
                end: Some(end.clone()),
                event_id: Some(event_id.clone()),
            },
            CalendarOperation::Unknown { .. } => return None,
        };
        Some(payload)
    }
}

/// JSON body posted to the calendar webhook. Unused fields are sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPayload {
    pub action: ActionKind,
    pub summary: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "eventId")]
    pub event_id: Option<String>,
}

/// Outcome recorded for one processed row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationResult {
    /// A locally produced failure record
    Error { status: String, message: String },
    /// The webhook's response, passed through untouched
    Webhook(Value),
}

impl OperationResult {
    /// Create a `{status: "error", message}` record
    pub fn error(message: impl Into<String>) -> Self {
        OperationResult::Error {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    /// Record for a row whose category label was not recognised
    pub fn unrecognized(label: &str) -> Self {
        Self::error(format!("不明な区分: {}", label))
    }
}

/// Response body of the batch endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub message: String,
    pub results: Vec<OperationResult>,
}
