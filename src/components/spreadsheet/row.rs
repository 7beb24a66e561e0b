use serde::Serialize;

use crate::utils::time::{normalize_date, normalize_time};

/// Column labels as they appear in the uploaded sheets
pub mod columns {
    pub const CATEGORY: &str = "区分";
    pub const DATE: &str = "日程";
    pub const START_TIME: &str = "開始時間";
    pub const END_TIME: &str = "終了時間";
    pub const TITLE: &str = "タイトル";
    pub const EVENT_ID: &str = "イベントID";
    pub const REVISED_START_TIME: &str = "開始時間(修正版)";
    pub const REVISED_END_TIME: &str = "終了時間(修正版)";
}

/// One spreadsheet row, keyed by header label in column order
///
/// Empty cells are not stored, so `get` returns `None` for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetRow {
    cells: Vec<(String, String)>,
    line: Option<usize>,
}

impl SpreadsheetRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            line: None,
        }
    }

    /// Record the 1-based sheet line the row was read from (the header is line 1)
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sheet line the row was read from, if it came from a file
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Pair header labels with rendered cell values, dropping blanks
    pub fn from_cells<I>(header: &[String], values: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut row = Self::new();
        for (label, value) in header.iter().zip(values) {
            if let Some(value) = value {
                row.insert(label, value);
            }
        }
        row
    }

    /// Set a cell value; whitespace-only values are ignored
    pub fn insert(&mut self, label: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        // Duplicate headers keep the leftmost value
        if self.get(label).is_none() {
            self.cells.push((label.to_string(), value));
        }
    }

    /// Builder-style `insert`
    pub fn with(mut self, label: &str, value: impl Into<String>) -> Self {
        self.insert(label, value);
        self
    }

    /// Look up a cell by its header label
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the row holds no values at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over the stored cells in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }
}

/// The fields of a row that drive calendar operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    pub category: Option<String>,
    /// YYYY-MM-DD when recognisable
    pub date: Option<String>,
    /// HH:MM when recognisable
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub title: Option<String>,
    pub event_id: Option<String>,
    pub revised_start_time: Option<String>,
    pub revised_end_time: Option<String>,
}

/// Extract the typed fields from a raw row. Absent values stay `None`.
pub fn normalize(row: &SpreadsheetRow) -> NormalizedRow {
    let text = |label: &str| {
        row.get(label)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let time = |label: &str| text(label).map(|v| normalize_time(&v));

    NormalizedRow {
        category: text(columns::CATEGORY),
        date: text(columns::DATE).map(|v| normalize_date(&v)),
        start_time: time(columns::START_TIME),
        end_time: time(columns::END_TIME),
        title: text(columns::TITLE),
        event_id: text(columns::EVENT_ID),
        revised_start_time: time(columns::REVISED_START_TIME),
        revised_end_time: time(columns::REVISED_END_TIME),
    }
}

/// Projection of a row returned by the upload preview
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PreviewRow {
    #[serde(rename = "区分")]
    pub category: Option<String>,
    #[serde(rename = "日程")]
    pub date: Option<String>,
    #[serde(rename = "開始時間")]
    pub start_time: Option<String>,
    #[serde(rename = "終了時間")]
    pub end_time: Option<String>,
    #[serde(rename = "タイトル")]
    pub title: Option<String>,
}

impl From<&SpreadsheetRow> for PreviewRow {
    fn from(row: &SpreadsheetRow) -> Self {
        let cell = |label: &str| row.get(label).map(str::to_string);
        Self {
            category: cell(columns::CATEGORY),
            date: cell(columns::DATE),
            start_time: cell(columns::START_TIME),
            end_time: cell(columns::END_TIME),
            title: cell(columns::TITLE),
        }
    }
}
