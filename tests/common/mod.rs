#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use sheetbridge::components::calendar::{CalendarPayload, CalendarWebhook};
use sheetbridge::components::chat::{ChatCompletion, ChatTurn};
use sheetbridge::error::{upstream_error, AppResult};
use sheetbridge::handlers::{router, AppState};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const BOUNDARY: &str = "sheetbridge-test-boundary";

pub const HEADER: &str = "区分,日程,開始時間,終了時間,タイトル,イベントID,開始時間(修正版),終了時間(修正版)";

/// Mock implementation of the calendar webhook for testing
#[derive(Debug, Default)]
pub struct MockCalendarWebhook {
    calls: Mutex<Vec<CalendarPayload>>,
    fail_on_call: Option<usize>,
}

impl MockCalendarWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the n-th call (1-based) with an upstream error
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<CalendarPayload> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl CalendarWebhook for MockCalendarWebhook {
    async fn execute(&self, payload: &CalendarPayload) -> AppResult<Value> {
        let mut calls = self.calls.lock().await;
        calls.push(payload.clone());

        if Some(calls.len()) == self.fail_on_call {
            return Err(upstream_error(
                "Google App Script Error: Status 500 Internal Server Error, Body: boom",
            ));
        }

        Ok(json!({
            "status": "success",
            "action": payload.action,
            "eventId": payload.event_id.clone().unwrap_or_else(|| format!("created-{}", calls.len())),
        }))
    }
}

/// Mock chat model that echoes the message and remembers the context size
#[derive(Debug, Default)]
pub struct MockChat {
    pub fail: bool,
    pub seen_context: Mutex<Vec<ChatTurn>>,
}

#[async_trait]
impl ChatCompletion for MockChat {
    async fn reply(&self, message: &str, context: &[ChatTurn]) -> AppResult<String> {
        if self.fail {
            return Err(upstream_error("ChatGPT API Error: rate limited"));
        }
        *self.seen_context.lock().await = context.to_vec();
        Ok(format!("echo: {}", message))
    }
}

/// Router wired to the given mocks
pub fn test_app(calendar: Arc<MockCalendarWebhook>, chat: Arc<MockChat>) -> axum::Router {
    router(AppState::new(calendar, chat), 1024 * 1024)
}

/// Build a CSV upload from data lines, prefixed with the standard header
pub fn csv(lines: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out.push('\n');
    out
}

/// Encode a single-file multipart body
pub fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
