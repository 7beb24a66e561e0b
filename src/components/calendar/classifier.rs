use super::models::{ActionKind, CalendarOperation, SENTINEL_TITLE};
use crate::components::spreadsheet::NormalizedRow;
use crate::error::{invalid_row, AppError, AppResult};

/// What to do with a row after looking at its title and category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Title is not the sentinel; the row produces nothing
    Skip,
    Eligible(ActionKind),
}

/// Decide whether a row becomes a calendar operation, and which one
///
/// Rows whose title is not `空き` are skipped before the category is looked
/// at. Category labels are matched case-insensitively in Japanese or English;
/// anything else is an `UnrecognizedCategory` carrying the lower-cased label.
pub fn classify(row: &NormalizedRow) -> AppResult<Classification> {
    if row.title.as_deref() != Some(SENTINEL_TITLE) {
        return Ok(Classification::Skip);
    }

    let label = row.category.as_deref().unwrap_or_default().to_lowercase();
    let kind = match label.as_str() {
        "追加" | "add" => ActionKind::Add,
        "削除" | "delete" => ActionKind::Delete,
        "修正" | "update" => ActionKind::Update,
        _ => return Err(AppError::UnrecognizedCategory { label }),
    };

    Ok(Classification::Eligible(kind))
}

/// Turn an eligible row into a concrete operation
///
/// Updates use the revised time columns. `row_number` is only used in error
/// messages.
pub fn build_operation(
    kind: ActionKind,
    row: &NormalizedRow,
    row_number: usize,
) -> AppResult<CalendarOperation> {
    let require = |value: &Option<String>, column: &str| {
        value
            .clone()
            .ok_or_else(|| invalid_row(row_number, &format!("missing value for {}", column)))
    };

    let operation = match kind {
        ActionKind::Add => {
            let date = require(&row.date, "日程")?;
            CalendarOperation::Add {
                summary: SENTINEL_TITLE.to_string(),
                start: timestamp(&date, &require(&row.start_time, "開始時間")?),
                end: timestamp(&date, &require(&row.end_time, "終了時間")?),
            }
        }
        ActionKind::Delete => CalendarOperation::Delete {
            event_id: require(&row.event_id, "イベントID")?,
        },
        ActionKind::Update => {
            let event_id = require(&row.event_id, "イベントID")?;
            let date = require(&row.date, "日程")?;
            CalendarOperation::Update {
                event_id,
                summary: SENTINEL_TITLE.to_string(),
                start: timestamp(&date, &require(&row.revised_start_time, "開始時間(修正版)")?),
                end: timestamp(&date, &require(&row.revised_end_time, "終了時間(修正版)")?),
            }
        }
    };

    Ok(operation)
}

/// `{date}T{time}:00`
pub fn timestamp(date: &str, time: &str) -> String {
    format!("{}T{}:00", date, time)
}
