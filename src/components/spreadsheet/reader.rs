use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Cursor;
use tracing::{debug, info};

use super::row::SpreadsheetRow;
use crate::error::{parse_error, AppResult};
use crate::utils::time::render_datetime;

/// Decode an uploaded spreadsheet into rows keyed by the header row
///
/// CSV is chosen by file extension; every other upload is handed to calamine,
/// which sniffs xlsx/xlsm/xlsb/xls/ods from the bytes. Only the first
/// worksheet is read and fully empty rows are dropped.
pub fn read_spreadsheet(file_name: Option<&str>, bytes: &[u8]) -> AppResult<Vec<SpreadsheetRow>> {
    info!(
        "Reading spreadsheet {} ({} bytes)",
        file_name.unwrap_or("<unnamed>"),
        bytes.len()
    );

    if bytes.is_empty() {
        return Err(parse_error("Uploaded file is empty"));
    }

    let rows = if is_csv(file_name) {
        read_csv(bytes)?
    } else {
        read_workbook(bytes)?
    };

    debug!("Decoded {} data rows", rows.len());
    Ok(rows)
}

fn is_csv(file_name: Option<&str>) -> bool {
    file_name
        .map(|name| name.to_lowercase().ends_with(".csv"))
        .unwrap_or(false)
}

fn read_workbook(bytes: &[u8]) -> AppResult<Vec<SpreadsheetRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error("Workbook contains no worksheets"))??;

    // The used range can start below leading blank rows
    let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => header_labels(cells.iter().map(render_cell)),
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .enumerate()
        .map(|(offset, cells)| {
            SpreadsheetRow::from_cells(&header, cells.iter().map(render_cell))
                .at_line(header_line + offset + 1)
        })
        .filter(|row| !row.is_empty())
        .collect())
}

fn read_csv(bytes: &[u8]) -> AppResult<Vec<SpreadsheetRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let header = header_labels(reader.headers()?.iter().map(|h| Some(h.to_string())));

    let mut rows = Vec::new();
    for (offset, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(offset + 2);
        let row = SpreadsheetRow::from_cells(&header, record.iter().map(|v| Some(v.to_string())))
            .at_line(line);
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn header_labels<I>(cells: I) -> Vec<String>
where
    I: Iterator<Item = Option<String>>,
{
    cells
        .map(|cell| {
            cell.unwrap_or_default()
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .collect()
}

/// Render a cell to the text a person would have typed into it
pub(crate) fn render_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(f) => Some(render_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(render_excel_datetime(dt)),
        Data::DateTimeIso(s) => Some(render_iso_datetime(s)),
        Data::DurationIso(s) => Some(render_iso_duration(s)),
    }
}

fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn render_excel_datetime(dt: &ExcelDateTime) -> String {
    // Serial values below one day carry no date part
    let time_only = dt.is_duration() || dt.as_f64() < 1.0;
    match dt.as_datetime() {
        Some(datetime) => render_datetime(datetime, time_only),
        None => render_float(dt.as_f64()),
    }
}

fn render_iso_datetime(value: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return render_datetime(datetime, false);
        }
    }
    value.to_string()
}

/// `PT10H30M00S` → `10:30`
fn render_iso_duration(value: &str) -> String {
    let Some(body) = value.strip_prefix("PT") else {
        return value.to_string();
    };

    let mut hours = 0u32;
    let mut minutes = 0u32;
    let mut number = String::new();
    for c in body.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' => hours = number.split('.').next().and_then(|n| n.parse().ok()).unwrap_or(0),
            'M' => minutes = number.split('.').next().and_then(|n| n.parse().ok()).unwrap_or(0),
            'S' => {}
            _ => return value.to_string(),
        }
        if c.is_ascii_alphabetic() {
            number.clear();
        }
    }

    if hours < 24 && minutes < 60 {
        format!("{:02}:{:02}", hours, minutes)
    } else {
        value.to_string()
    }
}
