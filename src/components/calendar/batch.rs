use tracing::{debug, info, warn};

use super::classifier::{build_operation, classify, Classification};
use super::models::{BatchOutcome, CalendarOperation, OperationResult, BATCH_COMPLETE_MESSAGE};
use super::webhook::CalendarWebhook;
use crate::components::spreadsheet::{normalize, SpreadsheetRow};
use crate::error::{AppError, AppResult};

/// Apply every eligible spreadsheet row to the calendar, in order
///
/// Rows are sent one at a time. The first webhook failure (or a row that is
/// missing required values) aborts the batch: rows already sent stay applied
/// on the remote calendar and no partial results are returned.
pub async fn run_batch(
    rows: &[SpreadsheetRow],
    webhook: &dyn CalendarWebhook,
) -> AppResult<BatchOutcome> {
    let mut results = Vec::new();
    let mut applied = 0usize;

    for (index, raw) in rows.iter().enumerate() {
        // Rows built in memory have no sheet line; assume a header on line 1
        let row_number = raw.line().unwrap_or(index + 2);
        let row = normalize(raw);

        let operation = match classify(&row) {
            Ok(Classification::Skip) => {
                debug!("Row {}: title is not the sentinel, skipping", row_number);
                continue;
            }
            Ok(Classification::Eligible(kind)) => build_operation(kind, &row, row_number)
                .inspect_err(|e| abort_warning(row_number, applied, e))?,
            Err(AppError::UnrecognizedCategory { label }) => {
                CalendarOperation::Unknown { raw_label: label }
            }
            Err(e) => return Err(e),
        };

        let Some(payload) = operation.to_payload() else {
            if let CalendarOperation::Unknown { raw_label } = &operation {
                warn!("Row {}: unrecognized category {:?}", row_number, raw_label);
                results.push(OperationResult::unrecognized(raw_label));
            }
            continue;
        };

        debug!("Row {}: sending {:?}", row_number, payload.action);
        let response = webhook
            .execute(&payload)
            .await
            .inspect_err(|e| abort_warning(row_number, applied, e))?;
        applied += 1;
        results.push(OperationResult::Webhook(response));
    }

    info!(
        "Calendar batch finished: {} rows read, {} operations applied, {} results",
        rows.len(),
        applied,
        results.len()
    );

    Ok(BatchOutcome {
        message: BATCH_COMPLETE_MESSAGE.to_string(),
        results,
    })
}

fn abort_warning(row_number: usize, applied: usize, err: &AppError) {
    warn!(
        "Row {}: {}; aborting batch after {} applied operations",
        row_number, err, applied
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::models::{ActionKind, CalendarPayload};
    use crate::components::spreadsheet::columns;
    use crate::error::upstream_error;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    /// Webhook that records payloads and fails on a chosen call
    #[derive(Default)]
    struct RecordingWebhook {
        calls: Mutex<Vec<CalendarPayload>>,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl CalendarWebhook for RecordingWebhook {
        async fn execute(&self, payload: &CalendarPayload) -> AppResult<Value> {
            let mut calls = self.calls.lock().await;
            calls.push(payload.clone());
            if Some(calls.len()) == self.fail_on_call {
                return Err(upstream_error("Google App Script Error: Status 500"));
            }
            Ok(json!({"status": "success", "call": calls.len()}))
        }
    }

    fn row(category: &str, title: &str) -> SpreadsheetRow {
        SpreadsheetRow::new()
            .with(columns::CATEGORY, category)
            .with(columns::DATE, "2024-05-01")
            .with(columns::START_TIME, "10:00")
            .with(columns::END_TIME, "11:00")
            .with(columns::TITLE, title)
            .with(columns::EVENT_ID, "evt-1")
            .with(columns::REVISED_START_TIME, "15:00")
            .with(columns::REVISED_END_TIME, "16:00")
    }

    #[tokio::test]
    async fn skipped_rows_produce_nothing() {
        let webhook = RecordingWebhook::default();
        let rows = vec![row("追加", "会議"), row("foo", "打合せ")];

        let outcome = run_batch(&rows, &webhook).await.unwrap();

        assert!(outcome.results.is_empty());
        assert!(webhook.calls.lock().await.is_empty());
        assert_eq!(outcome.message, BATCH_COMPLETE_MESSAGE);
    }

    #[tokio::test]
    async fn unknown_category_is_recorded_without_a_call() {
        let webhook = RecordingWebhook::default();
        let rows = vec![row("foo", "空き"), row("追加", "空き")];

        let outcome = run_batch(&rows, &webhook).await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0], OperationResult::unrecognized("foo"));
        assert_eq!(
            outcome.results[1],
            OperationResult::Webhook(json!({"status": "success", "call": 1}))
        );
        let calls = webhook.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].action, ActionKind::Add);
    }

    #[tokio::test]
    async fn webhook_failure_aborts_remaining_rows() {
        let webhook = RecordingWebhook {
            fail_on_call: Some(2),
            ..Default::default()
        };
        let rows = vec![row("追加", "空き"), row("削除", "空き"), row("修正", "空き")];

        let err = run_batch(&rows, &webhook).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(webhook.calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn incomplete_row_aborts_the_batch() {
        let webhook = RecordingWebhook::default();
        let incomplete = SpreadsheetRow::new()
            .with(columns::CATEGORY, "削除")
            .with(columns::TITLE, "空き");
        let rows = vec![row("追加", "空き"), incomplete, row("追加", "空き")];

        let err = run_batch(&rows, &webhook).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidRow { row: 3, .. }));
        assert_eq!(webhook.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_row_reports_the_sheet_line() {
        let webhook = RecordingWebhook::default();
        let incomplete = SpreadsheetRow::new()
            .with(columns::CATEGORY, "修正")
            .with(columns::TITLE, "空き")
            .at_line(7);
        let rows = vec![row("追加", "空き").at_line(2), incomplete];

        let err = run_batch(&rows, &webhook).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidRow { row: 7, .. }));
        assert!(err.to_string().starts_with("Invalid row at sheet line 7"));
    }
}
