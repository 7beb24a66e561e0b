mod common;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::MockCalendarWebhook;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sheetbridge::components::calendar::{
    run_batch, ActionKind, CalendarPayload, CalendarWebhook, HttpCalendarWebhook, OperationResult,
    SENTINEL_TITLE,
};
use sheetbridge::components::spreadsheet::{columns, SpreadsheetRow};
use sheetbridge::config::WebhookConfig;
use sheetbridge::error::AppError;
use url::Url;

fn free_row(category: &str) -> SpreadsheetRow {
    SpreadsheetRow::new()
        .with(columns::CATEGORY, category)
        .with(columns::DATE, "2024-06-10")
        .with(columns::START_TIME, "10:00")
        .with(columns::END_TIME, "11:00")
        .with(columns::TITLE, SENTINEL_TITLE)
        .with(columns::EVENT_ID, "evt-42")
        .with(columns::REVISED_START_TIME, "14:00")
        .with(columns::REVISED_END_TIME, "15:30")
}

/// Rows with any other title never reach the webhook
#[tokio::test]
async fn test_non_sentinel_rows_are_ignored() {
    let webhook = MockCalendarWebhook::new();
    let rows: Vec<SpreadsheetRow> = ["会議", "休み", "あき"]
        .iter()
        .map(|title| {
            SpreadsheetRow::new()
                .with(columns::CATEGORY, "追加")
                .with(columns::DATE, "2024-06-10")
                .with(columns::START_TIME, "10:00")
                .with(columns::END_TIME, "11:00")
                .with(columns::TITLE, *title)
        })
        .collect();

    let outcome = run_batch(&rows, &webhook).await.unwrap();

    assert!(outcome.results.is_empty());
    assert!(webhook.calls().await.is_empty());
}

/// Add rows use the original times, formatted as `{date}T{time}:00`
#[tokio::test]
async fn test_add_payload_timestamps() {
    let webhook = MockCalendarWebhook::new();
    let rows = vec![free_row("ADD")];

    run_batch(&rows, &webhook).await.unwrap();

    let calls = webhook.calls().await;
    assert_eq!(
        calls,
        vec![CalendarPayload {
            action: ActionKind::Add,
            summary: Some(SENTINEL_TITLE.to_string()),
            start: Some("2024-06-10T10:00:00".to_string()),
            end: Some("2024-06-10T11:00:00".to_string()),
            event_id: None,
        }]
    );
}

/// Update rows use the revised times, not the original ones
#[tokio::test]
async fn test_update_payload_uses_revised_times() {
    let webhook = MockCalendarWebhook::new();
    let rows = vec![free_row("修正")];

    run_batch(&rows, &webhook).await.unwrap();

    let calls = webhook.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].action, ActionKind::Update);
    assert_eq!(calls[0].event_id.as_deref(), Some("evt-42"));
    assert_eq!(calls[0].start.as_deref(), Some("2024-06-10T14:00:00"));
    assert_eq!(calls[0].end.as_deref(), Some("2024-06-10T15:30:00"));
}

/// An unrecognized category yields an error record and no call
#[tokio::test]
async fn test_unrecognized_category_record() {
    let webhook = MockCalendarWebhook::new();
    let rows = vec![free_row("foo")];

    let outcome = run_batch(&rows, &webhook).await.unwrap();

    assert_eq!(
        serde_json::to_value(&outcome.results).unwrap(),
        json!([{"status": "error", "message": "不明な区分: foo"}])
    );
    assert!(webhook.calls().await.is_empty());
}

/// N eligible rows give N results in input order
#[tokio::test]
async fn test_results_follow_row_order() {
    let webhook = MockCalendarWebhook::new();
    let rows = vec![free_row("追加"), free_row("削除"), free_row("修正"), free_row("追加")];

    let outcome = run_batch(&rows, &webhook).await.unwrap();

    let actions: Vec<Value> = outcome
        .results
        .iter()
        .map(|result| match result {
            OperationResult::Webhook(body) => body["action"].clone(),
            other => panic!("unexpected result: {:?}", other),
        })
        .collect();
    assert_eq!(actions, vec![json!("add"), json!("delete"), json!("update"), json!("add")]);
}

/// A webhook failure on row k stops rows k+1..N
#[tokio::test]
async fn test_failure_aborts_batch() {
    let webhook = MockCalendarWebhook::failing_on(2);
    let rows = vec![free_row("追加"), free_row("追加"), free_row("追加"), free_row("削除")];

    let err = run_batch(&rows, &webhook).await.unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    assert_eq!(webhook.calls().await.len(), 2);
}

/// Serve a stub webhook on a random local port
async fn spawn_stub(status: StatusCode) -> Url {
    let app = Router::new().route(
        "/exec",
        post(move |Json(payload): Json<Value>| async move {
            (status, Json(json!({"status": "success", "received": payload})))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Url::parse(&format!("http://{}/exec", addr)).unwrap()
}

/// The HTTP client posts the payload as JSON and returns the response body
#[tokio::test]
async fn test_http_webhook_round_trip() {
    let url = spawn_stub(StatusCode::OK).await;
    let webhook = HttpCalendarWebhook::new(&WebhookConfig { url });

    let payload = CalendarPayload {
        action: ActionKind::Delete,
        summary: None,
        start: None,
        end: None,
        event_id: Some("evt-1".to_string()),
    };
    let response = webhook.execute(&payload).await.unwrap();

    assert_eq!(response["status"], "success");
    assert_eq!(
        response["received"],
        json!({"action": "delete", "summary": null, "start": null, "end": null, "eventId": "evt-1"})
    );
}

/// Non-2xx responses become upstream errors
#[tokio::test]
async fn test_http_webhook_error_status() {
    let url = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR).await;
    let webhook = HttpCalendarWebhook::new(&WebhookConfig { url });

    let payload = CalendarPayload {
        action: ActionKind::Add,
        summary: Some(SENTINEL_TITLE.to_string()),
        start: Some("2024-06-10T10:00:00".to_string()),
        end: Some("2024-06-10T11:00:00".to_string()),
        event_id: None,
    };
    let err = webhook.execute(&payload).await.unwrap_err();

    match err {
        AppError::Upstream(message) => {
            assert!(message.starts_with("Google App Script Error"));
            assert!(message.contains("500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// Connection failures become upstream errors
#[tokio::test]
async fn test_http_webhook_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{}/exec", addr)).unwrap();
    let webhook = HttpCalendarWebhook::new(&WebhookConfig { url });
    let payload = CalendarPayload {
        action: ActionKind::Delete,
        summary: None,
        start: None,
        end: None,
        event_id: Some("evt-1".to_string()),
    };

    assert!(matches!(
        webhook.execute(&payload).await,
        Err(AppError::Upstream(_))
    ));
}
