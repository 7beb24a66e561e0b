mod reader;
pub mod row;

pub use reader::read_spreadsheet;
pub use row::{columns, normalize, NormalizedRow, PreviewRow, SpreadsheetRow};

/// Message returned by the upload preview
pub const PREVIEW_MESSAGE: &str = "ファイルを解析しました。";
